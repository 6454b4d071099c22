//! Render batch layer
//!
//! [`RenderBackend`] is the contract a GPU backend implements. Drawing code
//! never talks to it directly; it goes through [`BatchLayer`], which owns
//! the pass ordering and blend policy:
//!
//! - lines with opaque colour get an opaque depth-writing pass before the
//!   blended depth-reading pass
//! - filled triangles only write depth when opaque
//! - while rendering to an image every blended pass uses the `Max` blend
//!   equation so overlapping translucent linework does not double darken

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use dimkit_core::linework::BatchHandle;
use dimkit_core::text::TextTexture;

use crate::camera::CameraUniform;

/// Default depth offset pulling overlay geometry towards the camera.
pub const DEFAULT_DEPTH_OFFSET: f32 = -0.001;

/// Position-only vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    /// Position in the space given by the call's object transform.
    pub position: [f32; 3],
}

impl PositionVertex {
    /// Converts a coordinate list.
    pub fn from_points(points: &[Vec3]) -> Vec<Self> {
        points
            .iter()
            .map(|p| Self {
                position: p.to_array(),
            })
            .collect()
    }
}

/// Textured quad vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    /// World position.
    pub position: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

/// Depth comparison for a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepthTest {
    /// Regular visibility.
    #[default]
    LessEqual,
    /// Only where hidden behind other geometry.
    Greater,
}

/// Blend equation for a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlendEquation {
    /// Standard alpha blending.
    #[default]
    Add,
    /// Component-wise maximum, used while rendering to an image.
    Max,
}

/// Primitive assembly for line calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Topology {
    /// Independent segments, consumed pairwise.
    #[default]
    Lines,
    /// Connected strip.
    LineStrip,
}

/// Dash pattern for a line pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    /// Dash length.
    pub dash_length: f32,
    /// Gap length.
    pub gap_length: f32,
    /// Measure dashes in screen pixels instead of world units.
    pub screen_space: bool,
}

/// Identifies a cached backend batch.
///
/// A backend may keep uploaded vertex buffers keyed by `handle` and reuse
/// them while `generation` is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    /// Owning line group.
    pub handle: BatchHandle,
    /// Bumped whenever the coordinates change.
    pub generation: u64,
}

/// Uniforms for one line pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineUniforms {
    /// Line width in pixels.
    pub thickness: f32,
    /// RGBA colour.
    pub color: Vec4,
    /// Depth offset towards the camera (negative is closer).
    pub depth_offset: f32,
    /// Applied to every vertex by the backend.
    pub object_transform: Mat4,
    /// Write to the depth buffer.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_test: DepthTest,
    /// Blend equation.
    pub blend: BlendEquation,
    /// Primitive assembly.
    pub topology: Topology,
    /// Optional dash pattern.
    pub dash: Option<Dash>,
    /// Extension past each segment end in pixels.
    pub extension: f32,
}

/// Uniforms for a filled triangle call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillUniforms {
    /// RGBA colour.
    pub color: Vec4,
    /// Depth offset towards the camera.
    pub depth_offset: f32,
    /// Write to the depth buffer.
    pub depth_write: bool,
    /// Blend equation.
    pub blend: BlendEquation,
    /// Enable polygon smoothing.
    pub smooth: bool,
}

/// Uniforms for a point call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointUniforms {
    /// Point diameter in pixels.
    pub thickness: f32,
    /// RGBA colour.
    pub color: Vec4,
    /// Depth offset towards the camera.
    pub depth_offset: f32,
    /// Blend equation.
    pub blend: BlendEquation,
}

/// GPU backend contract.
pub trait RenderBackend {
    /// Called once before any draw of a frame.
    fn begin_frame(&mut self, _camera: &CameraUniform, _viewport: [f32; 2]) {}

    /// Draws a line pass.
    fn draw_lines(
        &mut self,
        uniforms: &LineUniforms,
        vertices: &[PositionVertex],
        cache: Option<BatchKey>,
    );

    /// Draws a triangle list.
    fn draw_filled_triangles(&mut self, uniforms: &FillUniforms, vertices: &[PositionVertex]);

    /// Draws round points.
    fn draw_points(&mut self, uniforms: &PointUniforms, vertices: &[PositionVertex]);

    /// Draws a text quad as a triangle fan.
    fn draw_textured_quad(
        &mut self,
        vertices: &[TexturedVertex; 4],
        texture: &TextTexture,
        texture_updated: bool,
    );
}

/// Per-call line options.
#[derive(Debug, Clone, Copy)]
pub struct LineOptions<'a> {
    /// Depth offset towards the camera.
    pub depth_offset: f32,
    /// Issue an opaque depth-writing pass first (opaque colours only).
    pub two_pass: bool,
    /// Follow with a point pass for round caps.
    pub point_pass: bool,
    /// Coordinates for the point pass, defaults to the line coordinates.
    pub point_coords: Option<&'a [Vec3]>,
    /// Depth comparison.
    pub depth_test: DepthTest,
    /// Primitive assembly.
    pub topology: Topology,
    /// Optional dash pattern.
    pub dash: Option<Dash>,
    /// Applied to every vertex by the backend.
    pub object_transform: Mat4,
    /// Extension past each segment end in pixels.
    pub extension: f32,
    /// Cached batch identity.
    pub cache: Option<BatchKey>,
}

impl Default for LineOptions<'_> {
    fn default() -> Self {
        Self {
            depth_offset: DEFAULT_DEPTH_OFFSET,
            two_pass: false,
            point_pass: false,
            point_coords: None,
            depth_test: DepthTest::LessEqual,
            topology: Topology::Lines,
            dash: None,
            object_transform: Mat4::IDENTITY,
            extension: 0.0,
            cache: None,
        }
    }
}

impl LineOptions<'_> {
    /// Opaque pass followed by the blended pass.
    pub fn two_pass() -> Self {
        Self {
            two_pass: true,
            ..Self::default()
        }
    }
}

/// Applies the pass policy on top of a backend.
pub struct BatchLayer<'a> {
    backend: &'a mut dyn RenderBackend,
    render: bool,
}

impl<'a> BatchLayer<'a> {
    /// Wraps a backend; `render` selects the `Max` blend equation.
    pub fn new(backend: &'a mut dyn RenderBackend, render: bool) -> Self {
        Self { backend, render }
    }

    fn blend(&self) -> BlendEquation {
        if self.render {
            BlendEquation::Max
        } else {
            BlendEquation::Add
        }
    }

    /// Draws lines with the two-pass policy.
    pub fn draw_lines(&mut self, weight: f32, color: Vec4, coords: &[Vec3], opts: &LineOptions) {
        if coords.is_empty() {
            return;
        }
        let vertices = PositionVertex::from_points(coords);
        let mut uniforms = LineUniforms {
            thickness: weight,
            color,
            depth_offset: opts.depth_offset,
            object_transform: opts.object_transform,
            depth_write: true,
            depth_test: opts.depth_test,
            blend: BlendEquation::Add,
            topology: opts.topology,
            dash: opts.dash,
            extension: opts.extension,
        };

        if color.w == 1.0 && opts.two_pass {
            self.backend.draw_lines(&uniforms, &vertices, opts.cache);
        }

        uniforms.depth_write = false;
        uniforms.blend = self.blend();
        self.backend.draw_lines(&uniforms, &vertices, opts.cache);
        tracing::trace!("draw_lines: {} vertices", vertices.len());

        if opts.point_pass {
            let points = opts.point_coords.unwrap_or(coords);
            self.draw_points(weight, color, points, opts.depth_offset);
        }
    }

    /// Draws a triangle list.
    pub fn draw_filled(&mut self, coords: &[Vec3], color: Vec4, smooth: bool) {
        if coords.is_empty() {
            return;
        }
        let uniforms = FillUniforms {
            color,
            depth_offset: DEFAULT_DEPTH_OFFSET,
            depth_write: color.w == 1.0,
            blend: self.blend(),
            smooth,
        };
        self.backend
            .draw_filled_triangles(&uniforms, &PositionVertex::from_points(coords));
    }

    /// Draws round points.
    pub fn draw_points(&mut self, weight: f32, color: Vec4, coords: &[Vec3], depth_offset: f32) {
        if coords.is_empty() {
            return;
        }
        let uniforms = PointUniforms {
            thickness: weight,
            color,
            depth_offset,
            blend: self.blend(),
        };
        self.backend
            .draw_points(&uniforms, &PositionVertex::from_points(coords));
    }

    /// Draws a text quad.
    pub fn draw_textured_quad(
        &mut self,
        vertices: &[TexturedVertex; 4],
        texture: &TextTexture,
        texture_updated: bool,
    ) {
        self.backend
            .draw_textured_quad(vertices, texture, texture_updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawCall, RecordingBackend};

    const LINE: [Vec3; 2] = [Vec3::ZERO, Vec3::X];

    #[test]
    fn test_opaque_two_pass_order() {
        let mut backend = RecordingBackend::new();
        let mut layer = BatchLayer::new(&mut backend, false);
        layer.draw_lines(1.0, Vec4::ONE, &LINE, &LineOptions::two_pass());

        let passes: Vec<(bool, BlendEquation)> = backend
            .line_calls()
            .map(|(u, _)| (u.depth_write, u.blend))
            .collect();
        assert_eq!(
            passes,
            vec![(true, BlendEquation::Add), (false, BlendEquation::Add)]
        );
    }

    #[test]
    fn test_translucent_single_pass_with_max_blend() {
        let mut backend = RecordingBackend::new();
        let mut layer = BatchLayer::new(&mut backend, true);
        layer.draw_lines(
            1.0,
            Vec4::new(1.0, 1.0, 1.0, 0.5),
            &LINE,
            &LineOptions::two_pass(),
        );

        let passes: Vec<(bool, BlendEquation)> = backend
            .line_calls()
            .map(|(u, _)| (u.depth_write, u.blend))
            .collect();
        assert_eq!(passes, vec![(false, BlendEquation::Max)]);
    }

    #[test]
    fn test_point_pass_uses_own_coords() {
        let mut backend = RecordingBackend::new();
        let mut layer = BatchLayer::new(&mut backend, false);
        let centre = [Vec3::Y];
        let opts = LineOptions {
            point_pass: true,
            point_coords: Some(&centre),
            ..LineOptions::default()
        };
        layer.draw_lines(2.0, Vec4::ONE, &LINE, &opts);

        match backend.calls.last() {
            Some(DrawCall::Points { vertices, .. }) => assert_eq!(vertices, &vec![Vec3::Y]),
            other => panic!("expected point call, got {other:?}"),
        }
    }

    #[test]
    fn test_translucent_fill_skips_depth_write() {
        let mut backend = RecordingBackend::new();
        let mut layer = BatchLayer::new(&mut backend, false);
        layer.draw_filled(&[Vec3::ZERO, Vec3::X, Vec3::Y], Vec4::splat(0.5), true);
        match &backend.calls[0] {
            DrawCall::Triangles { uniforms, .. } => assert!(!uniforms.depth_write),
            other => panic!("expected triangles, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_coords_emit_nothing() {
        let mut backend = RecordingBackend::new();
        let mut layer = BatchLayer::new(&mut backend, false);
        layer.draw_lines(1.0, Vec4::ONE, &[], &LineOptions::two_pass());
        layer.draw_filled(&[], Vec4::ONE, false);
        assert!(backend.calls.is_empty());
    }
}
