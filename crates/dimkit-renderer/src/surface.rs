//! Vector drawing surface
//!
//! Every emission made to the render batch layer has a structurally
//! identical call here, so a vector export shows exactly what the viewport
//! shows. [`SvgSurface`] projects world coordinates through the frame camera
//! and writes SVG text.

use glam::{Vec2, Vec3, Vec4};

use dimkit_core::text::TextCard;

use crate::batch::Topology;
use crate::camera::Camera;

/// Stroke parameters for a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// RGBA colour.
    pub color: Vec4,
    /// Stroke width in pixels.
    pub weight: f32,
    /// Optional dash and gap lengths.
    pub dash: Option<[f32; 2]>,
}

impl StrokeStyle {
    /// Solid stroke.
    pub fn solid(color: Vec4, weight: f32) -> Self {
        Self {
            color,
            weight,
            dash: None,
        }
    }
}

/// Paint parameters for a text node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// RGBA colour.
    pub color: Vec4,
    /// Font size in points.
    pub font_size: f32,
}

/// Line hatch pattern declared once per object.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDef {
    /// Identifier referenced by polygon fills.
    pub id: String,
    /// Hatch line colour.
    pub color: Vec4,
    /// Hatch line weight.
    pub weight: f32,
    /// Tile size in pixels.
    pub size: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Pattern opacity.
    pub opacity: f32,
}

/// Generic vector drawing surface.
pub trait DrawingSurface {
    /// Opens a named group; groups nest.
    fn begin_group(&mut self, id: &str);

    /// Closes the innermost group.
    fn end_group(&mut self);

    /// Adds stroked geometry. `Lines` consumes the points pairwise,
    /// `LineStrip` draws one open polyline.
    fn add_path(&mut self, points: &[Vec3], topology: Topology, stroke: &StrokeStyle);

    /// Adds a filled triangle list.
    fn add_fill(&mut self, triangles: &[Vec3], color: Vec4);

    /// Adds a closed polygon with optional outline and pattern overlay.
    fn add_polygon(
        &mut self,
        points: &[Vec3],
        fill: Vec4,
        stroke: Option<&StrokeStyle>,
        pattern: Option<&str>,
    );

    /// Adds a text block laid out on `card`, anchored at `origin`.
    fn add_text(&mut self, text: &str, origin: Vec3, card: &TextCard, style: &TextStyle);

    /// Declares a hatch pattern.
    fn add_pattern(&mut self, pattern: &PatternDef);

    /// Adds a filled dot with a pixel radius.
    fn add_circle(&mut self, center: Vec3, radius: f32, color: Vec4);
}

/// Escape special characters for XML
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn svg_color(color: Vec4) -> String {
    let c = (color.truncate().clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    format!("rgb({},{},{})", c.x as u8, c.y as u8, c.z as u8)
}

fn stroke_attrs(stroke: &StrokeStyle) -> String {
    let mut attrs = format!(
        r#"stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}" stroke-linecap="round""#,
        svg_color(stroke.color),
        stroke.color.w,
        stroke.weight
    );
    if let Some([dash, gap]) = stroke.dash {
        attrs.push_str(&format!(r#" stroke-dasharray="{dash:.2},{gap:.2}""#));
    }
    attrs
}

/// SVG writer projecting through a camera.
pub struct SvgSurface {
    camera: Camera,
    width: f32,
    height: f32,
    defs: String,
    body: String,
    depth: usize,
}

impl SvgSurface {
    /// Creates an empty document of `width` by `height` pixels.
    pub fn new(camera: Camera, width: f32, height: f32) -> Self {
        Self {
            camera,
            width,
            height,
            defs: String::new(),
            body: String::new(),
            depth: 0,
        }
    }

    fn project(&self, point: Vec3) -> Vec2 {
        self.camera
            .project_to_screen(point, self.width, self.height)
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth + 1)
    }

    fn points_attr(&self, points: &[Vec3]) -> String {
        points
            .iter()
            .map(|p| {
                let s = self.project(*p);
                format!("{:.2},{:.2}", s.x, s.y)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Closes any open groups and returns the document.
    pub fn finish(mut self) -> String {
        while self.depth > 0 {
            self.end_group();
        }
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
            w = self.width,
            h = self.height
        ));
        svg.push('\n');
        if !self.defs.is_empty() {
            svg.push_str("  <defs>\n");
            svg.push_str(&self.defs);
            svg.push_str("  </defs>\n");
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }
}

impl DrawingSurface for SvgSurface {
    fn begin_group(&mut self, id: &str) {
        self.body
            .push_str(&format!("{}<g id=\"{}\">\n", self.indent(), xml_escape(id)));
        self.depth += 1;
    }

    fn end_group(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        self.body.push_str(&format!("{}</g>\n", self.indent()));
    }

    fn add_path(&mut self, points: &[Vec3], topology: Topology, stroke: &StrokeStyle) {
        if points.len() < 2 {
            return;
        }
        let attrs = stroke_attrs(stroke);
        match topology {
            Topology::Lines => {
                let mut d = String::new();
                for pair in points.chunks_exact(2) {
                    let a = self.project(pair[0]);
                    let b = self.project(pair[1]);
                    d.push_str(&format!("M{:.2},{:.2}L{:.2},{:.2}", a.x, a.y, b.x, b.y));
                }
                self.body.push_str(&format!(
                    "{}<path d=\"{}\" fill=\"none\" {}/>\n",
                    self.indent(),
                    d,
                    attrs
                ));
            }
            Topology::LineStrip => {
                self.body.push_str(&format!(
                    "{}<polyline points=\"{}\" fill=\"none\" {}/>\n",
                    self.indent(),
                    self.points_attr(points),
                    attrs
                ));
            }
        }
    }

    fn add_fill(&mut self, triangles: &[Vec3], color: Vec4) {
        for tri in triangles.chunks_exact(3) {
            self.body.push_str(&format!(
                "{}<polygon points=\"{}\" fill=\"{}\" fill-opacity=\"{:.3}\" stroke=\"none\"/>\n",
                self.indent(),
                self.points_attr(tri),
                svg_color(color),
                color.w
            ));
        }
    }

    fn add_polygon(
        &mut self,
        points: &[Vec3],
        fill: Vec4,
        stroke: Option<&StrokeStyle>,
        pattern: Option<&str>,
    ) {
        if points.len() < 3 {
            return;
        }
        let stroke = stroke.map(stroke_attrs).unwrap_or_else(|| "stroke=\"none\"".into());
        let points = self.points_attr(points);
        self.body.push_str(&format!(
            "{}<polygon points=\"{}\" fill=\"{}\" fill-opacity=\"{:.3}\" {}/>\n",
            self.indent(),
            points,
            svg_color(fill),
            fill.w,
            stroke
        ));
        if let Some(id) = pattern {
            self.body.push_str(&format!(
                "{}<polygon points=\"{}\" fill=\"url(#{})\" stroke=\"none\"/>\n",
                self.indent(),
                points,
                xml_escape(id)
            ));
        }
    }

    fn add_text(&mut self, text: &str, origin: Vec3, card: &TextCard, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let [c0, c1, _, c3] = *card.points();
        let bottom_left = self.project(c0);
        let bottom_right = self.project(c3);
        let top_left = self.project(c1);

        // Keep the baseline reading left to right on screen.
        let mut baseline = bottom_right - bottom_left;
        let mut anchor = (bottom_left + bottom_right) * 0.5;
        if baseline.x < 0.0 {
            baseline = -baseline;
            anchor = (self.project(card.points()[1]) + self.project(card.points()[2])) * 0.5;
        }
        let angle = baseline.y.atan2(baseline.x).to_degrees();
        let height = (top_left - bottom_left).length();
        let size = if height > 0.0 {
            height / 1.3
        } else {
            style.font_size
        };
        tracing::trace!("svg text '{}' at {:?}", text, origin);

        self.body.push_str(&format!(
            "{}<text x=\"{:.2}\" y=\"{:.2}\" transform=\"rotate({:.2} {:.2} {:.2})\" text-anchor=\"middle\" font-size=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.3}\">{}</text>\n",
            self.indent(),
            anchor.x,
            anchor.y,
            angle,
            anchor.x,
            anchor.y,
            size,
            svg_color(style.color),
            style.color.w,
            xml_escape(text)
        ));
    }

    fn add_pattern(&mut self, pattern: &PatternDef) {
        let size = pattern.size.max(1.0);
        self.defs.push_str(&format!(
            "    <pattern id=\"{}\" width=\"{:.2}\" height=\"{:.2}\" patternUnits=\"userSpaceOnUse\" patternTransform=\"rotate({:.2})\">\n",
            xml_escape(&pattern.id),
            size,
            size,
            pattern.rotation
        ));
        self.defs.push_str(&format!(
            "      <line x1=\"0\" y1=\"0\" x2=\"0\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-opacity=\"{:.3}\"/>\n",
            size,
            svg_color(pattern.color),
            pattern.weight,
            pattern.opacity
        ));
        self.defs.push_str("    </pattern>\n");
    }

    fn add_circle(&mut self, center: Vec3, radius: f32, color: Vec4) {
        let c = self.project(center);
        self.body.push_str(&format!(
            "{}<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.3}\"/>\n",
            self.indent(),
            c.x,
            c.y,
            radius,
            svg_color(color),
            color.w
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> SvgSurface {
        let camera =
            Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y).orthographic(10.0);
        SvgSurface::new(camera, 100.0, 100.0)
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_path_segments_are_projected() {
        let mut svg = surface();
        svg.begin_group("dim");
        svg.add_path(
            &[Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)],
            Topology::Lines,
            &StrokeStyle::solid(Vec4::new(0.0, 0.0, 0.0, 1.0), 1.0),
        );
        let doc = svg.finish();
        assert!(doc.contains(r#"<g id="dim">"#));
        assert!(doc.contains("M50.00,50.00L100.00,50.00"));
        assert!(doc.contains("</g>"));
        assert!(doc.ends_with("</svg>\n"));
    }

    #[test]
    fn test_polyline_for_strips() {
        let mut svg = surface();
        svg.add_path(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            Topology::LineStrip,
            &StrokeStyle::solid(Vec4::ONE, 2.0),
        );
        assert!(svg.finish().contains("<polyline"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut svg = surface();
        let card = TextCard([
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
        ]);
        let style = TextStyle {
            color: Vec4::ONE,
            font_size: 12.0,
        };
        svg.add_text("1 < 2", Vec3::ZERO, &card, &style);
        assert!(svg.finish().contains(">1 &lt; 2</text>"));
    }

    #[test]
    fn test_pattern_goes_to_defs() {
        let mut svg = surface();
        svg.add_pattern(&PatternDef {
            id: "brick".into(),
            color: Vec4::ONE,
            weight: 1.0,
            size: 8.0,
            rotation: 45.0,
            opacity: 1.0,
        });
        svg.add_polygon(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            Vec4::ONE,
            None,
            Some("brick"),
        );
        let doc = svg.finish();
        assert!(doc.contains("<defs>"));
        assert!(doc.contains(r#"fill="url(#brick)""#));
    }
}
