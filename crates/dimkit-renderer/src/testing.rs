//! In-memory doubles for the external collaborators
//!
//! Hosts can use these to test their own integration; the crate's tests use
//! them to assert on emitted geometry.

use glam::{Vec3, Vec4};

use dimkit_core::text::{TextCard, TextTexture};

use crate::batch::{
    BatchKey, FillUniforms, LineUniforms, PointUniforms, PositionVertex, RenderBackend,
    TexturedVertex, Topology,
};
use crate::camera::CameraUniform;
use crate::surface::{DrawingSurface, PatternDef, StrokeStyle, TextStyle};
use crate::text_layout::{FontId, FontRasterizer};

fn positions(vertices: &[PositionVertex]) -> Vec<Vec3> {
    vertices.iter().map(|v| Vec3::from_array(v.position)).collect()
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// `draw_lines`
    Lines {
        /// Uniforms of the pass.
        uniforms: LineUniforms,
        /// Vertex positions.
        vertices: Vec<Vec3>,
        /// Batch identity.
        cache: Option<BatchKey>,
    },
    /// `draw_filled_triangles`
    Triangles {
        /// Uniforms of the call.
        uniforms: FillUniforms,
        /// Vertex positions.
        vertices: Vec<Vec3>,
    },
    /// `draw_points`
    Points {
        /// Uniforms of the call.
        uniforms: PointUniforms,
        /// Vertex positions.
        vertices: Vec<Vec3>,
    },
    /// `draw_textured_quad`
    TexturedQuad {
        /// Quad corners and texture coordinates.
        vertices: [TexturedVertex; 4],
        /// Texture width in pixels.
        width: u32,
        /// Texture height in pixels.
        height: u32,
        /// The texture changed since the last upload.
        texture_updated: bool,
    },
}

/// Backend that records every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    /// Calls in issue order.
    pub calls: Vec<DrawCall>,
    /// Number of `begin_frame` calls.
    pub frames: usize,
}

impl RecordingBackend {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Line passes in issue order.
    pub fn line_calls(&self) -> impl Iterator<Item = (&LineUniforms, &Vec<Vec3>)> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Lines {
                uniforms, vertices, ..
            } => Some((uniforms, vertices)),
            _ => None,
        })
    }

    /// Vertices of every blended line pass, concatenated.
    pub fn blended_line_vertices(&self) -> Vec<Vec3> {
        self.line_calls()
            .filter(|(u, _)| !u.depth_write)
            .flat_map(|(_, v)| v.iter().copied())
            .collect()
    }

    /// Vertices of every triangle call, concatenated.
    pub fn triangle_vertices(&self) -> Vec<Vec3> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Triangles { vertices, .. } => Some(vertices.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Number of text quads drawn.
    pub fn text_quads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::TexturedQuad { .. }))
            .count()
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, _camera: &CameraUniform, _viewport: [f32; 2]) {
        self.frames += 1;
    }

    fn draw_lines(
        &mut self,
        uniforms: &LineUniforms,
        vertices: &[PositionVertex],
        cache: Option<BatchKey>,
    ) {
        self.calls.push(DrawCall::Lines {
            uniforms: *uniforms,
            vertices: positions(vertices),
            cache,
        });
    }

    fn draw_filled_triangles(&mut self, uniforms: &FillUniforms, vertices: &[PositionVertex]) {
        self.calls.push(DrawCall::Triangles {
            uniforms: *uniforms,
            vertices: positions(vertices),
        });
    }

    fn draw_points(&mut self, uniforms: &PointUniforms, vertices: &[PositionVertex]) {
        self.calls.push(DrawCall::Points {
            uniforms: *uniforms,
            vertices: positions(vertices),
        });
    }

    fn draw_textured_quad(
        &mut self,
        vertices: &[TexturedVertex; 4],
        texture: &TextTexture,
        texture_updated: bool,
    ) {
        self.calls.push(DrawCall::TexturedQuad {
            vertices: *vertices,
            width: texture.width,
            height: texture.height,
            texture_updated,
        });
    }
}

/// One recorded surface node.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceNode {
    /// Group opened.
    BeginGroup(String),
    /// Group closed.
    EndGroup,
    /// Stroked path.
    Path {
        /// World points.
        points: Vec<Vec3>,
        /// Segment assembly.
        topology: Topology,
        /// Stroke.
        stroke: StrokeStyle,
    },
    /// Filled triangles.
    Fill {
        /// World triangle list.
        triangles: Vec<Vec3>,
        /// Fill colour.
        color: Vec4,
    },
    /// Closed polygon.
    Polygon {
        /// World outline.
        points: Vec<Vec3>,
        /// Fill colour.
        fill: Vec4,
        /// Referenced pattern.
        pattern: Option<String>,
    },
    /// Text block.
    Text {
        /// Content.
        text: String,
        /// Anchor.
        origin: Vec3,
        /// Card corners.
        card: TextCard,
    },
    /// Pattern declaration.
    Pattern(String),
    /// Dot.
    Circle {
        /// World centre.
        center: Vec3,
        /// Pixel radius.
        radius: f32,
    },
}

/// Surface that records every node.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    /// Nodes in emission order.
    pub nodes: Vec<SurfaceNode>,
}

impl RecordingSurface {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of every opened group.
    pub fn groups(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                SurfaceNode::BeginGroup(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Content of every text node.
    pub fn texts(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                SurfaceNode::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawingSurface for RecordingSurface {
    fn begin_group(&mut self, id: &str) {
        self.nodes.push(SurfaceNode::BeginGroup(id.to_string()));
    }

    fn end_group(&mut self) {
        self.nodes.push(SurfaceNode::EndGroup);
    }

    fn add_path(&mut self, points: &[Vec3], topology: Topology, stroke: &StrokeStyle) {
        self.nodes.push(SurfaceNode::Path {
            points: points.to_vec(),
            topology,
            stroke: *stroke,
        });
    }

    fn add_fill(&mut self, triangles: &[Vec3], color: Vec4) {
        self.nodes.push(SurfaceNode::Fill {
            triangles: triangles.to_vec(),
            color,
        });
    }

    fn add_polygon(
        &mut self,
        points: &[Vec3],
        fill: Vec4,
        _stroke: Option<&StrokeStyle>,
        pattern: Option<&str>,
    ) {
        self.nodes.push(SurfaceNode::Polygon {
            points: points.to_vec(),
            fill,
            pattern: pattern.map(str::to_string),
        });
    }

    fn add_text(&mut self, text: &str, origin: Vec3, card: &TextCard, _style: &TextStyle) {
        self.nodes.push(SurfaceNode::Text {
            text: text.to_string(),
            origin,
            card: *card,
        });
    }

    fn add_pattern(&mut self, pattern: &PatternDef) {
        self.nodes.push(SurfaceNode::Pattern(pattern.id.clone()));
    }

    fn add_circle(&mut self, center: Vec3, radius: f32, _color: Vec4) {
        self.nodes.push(SurfaceNode::Circle { center, radius });
    }
}

/// Font double with fixed glyph metrics.
///
/// Every glyph is `advance` pixels wide and `line_height` pixels tall at
/// size 1 and 72 dpi; both scale linearly with size and dpi.
#[derive(Debug, Clone)]
pub struct MonospaceRasterizer {
    /// Glyph advance at size 1 and 72 dpi.
    pub advance: f32,
    /// Glyph height at size 1 and 72 dpi.
    pub line_height: f32,
    /// Font names that load successfully.
    pub known_fonts: Vec<String>,
}

impl Default for MonospaceRasterizer {
    fn default() -> Self {
        Self {
            advance: 0.5,
            line_height: 1.0,
            known_fonts: Vec::new(),
        }
    }
}

impl MonospaceRasterizer {
    /// Rasterizer with the default metrics.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FontRasterizer for MonospaceRasterizer {
    fn load_font(&mut self, name: &str) -> Option<FontId> {
        self.known_fonts
            .iter()
            .position(|f| f == name)
            .map(|i| FontId(i as u32 + 1))
    }

    fn measure(&self, text: &str, _font: FontId, size: f32, dpi: u32) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let factor = size * dpi as f32 / 72.0;
        (
            text.chars().count() as f32 * self.advance * factor,
            self.line_height * factor,
        )
    }

    fn rasterize(
        &self,
        _text: &str,
        _font: FontId,
        _size: f32,
        _dpi: u32,
        width: u32,
        height: u32,
        color: Vec4,
    ) -> Vec<u8> {
        let pixel = (color * 255.0).round().to_array().map(|c| c.clamp(0.0, 255.0) as u8);
        pixel
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect()
    }
}
