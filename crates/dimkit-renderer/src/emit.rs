//! Paired raster and vector emission
//!
//! [`Output`] bundles the batch layer with the drawing surface of a vector
//! frame. Drawing code issues its raster calls through `batch` and, when a
//! surface is present, the matching vector nodes through the helpers here.

use glam::{Mat4, Vec3, Vec4};

use dimkit_core::text::TextField;

use crate::batch::{BatchLayer, RenderBackend, Topology};
use crate::surface::{DrawingSurface, StrokeStyle, TextStyle};

/// Destinations for one frame.
pub struct Output<'a> {
    /// Raster calls.
    pub batch: BatchLayer<'a>,
    surface: Option<&'a mut dyn DrawingSurface>,
}

impl<'a> Output<'a> {
    /// Raster-only output.
    pub fn raster(backend: &'a mut dyn RenderBackend, render: bool) -> Self {
        Self {
            batch: BatchLayer::new(backend, render),
            surface: None,
        }
    }

    /// Raster output mirrored to a drawing surface.
    pub fn vector(backend: &'a mut dyn RenderBackend, surface: &'a mut dyn DrawingSurface) -> Self {
        Self {
            batch: BatchLayer::new(backend, true),
            surface: Some(surface),
        }
    }

    /// The drawing surface, present only in vector frames.
    pub fn surface(&mut self) -> Option<&mut (dyn DrawingSurface + 'a)> {
        self.surface.as_deref_mut()
    }

    /// True when vector nodes are being collected.
    pub fn is_vector(&self) -> bool {
        self.surface.is_some()
    }

    /// Emits the vector group for one dimension or annotation: its segment
    /// list, its filled triangles and one text node per placed field.
    pub fn vector_item(&mut self, item: &VectorItem<'_>) {
        let Some(surface) = self.surface() else {
            return;
        };
        surface.begin_group(item.name);
        surface.add_path(
            item.lines,
            Topology::Lines,
            &StrokeStyle::solid(item.color, item.weight),
        );
        if !item.filled.is_empty() {
            surface.add_fill(item.filled, item.color);
        }
        let text_style = TextStyle {
            color: item.color,
            font_size: item.font_size,
        };
        for field in item.texts {
            if let Some(card) = &field.card {
                surface.add_text(&field.text, item.text_origin, card, &text_style);
            }
        }
        surface.end_group();
    }

    /// Mirrors a stroked path in world space.
    pub fn vector_path(
        &mut self,
        coords: &[Vec3],
        transform: Mat4,
        topology: Topology,
        stroke: &StrokeStyle,
    ) {
        let Some(surface) = self.surface() else {
            return;
        };
        if transform == Mat4::IDENTITY {
            surface.add_path(coords, topology, stroke);
        } else {
            let world: Vec<Vec3> = coords
                .iter()
                .map(|p| transform.transform_point3(*p))
                .collect();
            surface.add_path(&world, topology, stroke);
        }
    }

    /// Mirrors a dot.
    pub fn vector_circle(&mut self, center: Vec3, radius: f32, color: Vec4) {
        if let Some(surface) = self.surface() {
            surface.add_circle(center, radius, color);
        }
    }
}

/// Vector counterpart of one drawn item.
pub struct VectorItem<'a> {
    /// Group identifier.
    pub name: &'a str,
    /// Segment list, consumed pairwise.
    pub lines: &'a [Vec3],
    /// Triangle list.
    pub filled: &'a [Vec3],
    /// Stroke width.
    pub weight: f32,
    /// Colour of every node.
    pub color: Vec4,
    /// Fields whose cards were placed this frame.
    pub texts: &'a [TextField],
    /// Anchor handed to the surface with each text node.
    pub text_origin: Vec3,
    /// Font size in points.
    pub font_size: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingBackend, RecordingSurface, SurfaceNode};
    use dimkit_core::text::TextCard;

    #[test]
    fn test_vector_item_groups_nodes() {
        let mut backend = RecordingBackend::new();
        let mut surface = RecordingSurface::new();
        let mut field = TextField::new("1.00 m");
        field.card = Some(TextCard([Vec3::ZERO, Vec3::Y, Vec3::ONE, Vec3::X]));
        {
            let mut out = Output::vector(&mut backend, &mut surface);
            out.vector_item(&VectorItem {
                name: "dim",
                lines: &[Vec3::ZERO, Vec3::X],
                filled: &[],
                weight: 1.0,
                color: Vec4::ONE,
                texts: std::slice::from_ref(&field),
                text_origin: Vec3::ZERO,
                font_size: 12.0,
            });
        }
        assert!(matches!(surface.nodes[0], SurfaceNode::BeginGroup(ref id) if id == "dim"));
        assert!(matches!(surface.nodes[1], SurfaceNode::Path { .. }));
        assert!(matches!(surface.nodes[2], SurfaceNode::Text { ref text, .. } if text == "1.00 m"));
        assert!(matches!(surface.nodes[3], SurfaceNode::EndGroup));
    }

    #[test]
    fn test_raster_output_skips_vector_nodes() {
        let mut backend = RecordingBackend::new();
        let mut out = Output::raster(&mut backend, false);
        assert!(!out.is_vector());
        out.vector_circle(Vec3::ZERO, 1.0, Vec4::ONE);
        out.vector_path(
            &[Vec3::ZERO, Vec3::X],
            Mat4::IDENTITY,
            Topology::Lines,
            &StrokeStyle::solid(Vec4::ONE, 1.0),
        );
    }

    #[test]
    fn test_vector_path_applies_transform() {
        let mut backend = RecordingBackend::new();
        let mut surface = RecordingSurface::new();
        {
            let mut out = Output::vector(&mut backend, &mut surface);
            out.vector_path(
                &[Vec3::ZERO, Vec3::X],
                Mat4::from_translation(Vec3::Z),
                Topology::Lines,
                &StrokeStyle::solid(Vec4::ONE, 1.0),
            );
        }
        match &surface.nodes[0] {
            SurfaceNode::Path { points, .. } => assert_eq!(points[0], Vec3::Z),
            other => panic!("expected path, got {other:?}"),
        }
    }
}
