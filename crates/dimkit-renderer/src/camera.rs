//! Camera used for view-dependent geometry and vector projection

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3};

/// Camera uniform buffer data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// Projection times view.
    pub view_proj: [[f32; 4]; 4],
    /// World to camera.
    pub view: [[f32; 4]; 4],
    /// Camera to clip space.
    pub proj: [[f32; 4]; 4],
    /// Camera position (w = 1).
    pub eye: [f32; 4],
}

/// Camera projection model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective {
        /// Vertical field of view in radians.
        fov: f32,
    },
    /// Orthographic with the given vertical extent in world units.
    Orthographic {
        /// Height of the visible area in world units.
        scale: f32,
    },
}

/// Viewport or scene camera.
///
/// The camera looks down its local `-Z` with `+Y` up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub rotation: Quat,
    /// Projection model.
    pub projection: Projection,
    /// Width over height.
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
    }
}

impl Camera {
    /// Perspective camera at `position` looking at `target`.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position,
            rotation,
            projection: Projection::Perspective {
                fov: 40.0_f32.to_radians(),
            },
            aspect: 1.0,
            near: 0.1,
            far: 100000.0,
        }
    }

    /// Switches to an orthographic projection.
    pub fn orthographic(mut self, scale: f32) -> Self {
        self.projection = Projection::Orthographic { scale };
        self
    }

    /// True for orthographic projections.
    pub fn is_ortho(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov } => {
                Mat4::perspective_rh(fov, self.aspect, self.near, self.far)
            }
            Projection::Orthographic { scale } => {
                let half_h = scale * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    /// Projection times view.
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get camera uniform data
    pub fn uniform(&self) -> CameraUniform {
        let view = self.view_matrix();
        let proj = self.projection_matrix();
        let view_proj = proj * view;

        CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            eye: [self.position.x, self.position.y, self.position.z, 1.0],
        }
    }

    /// Camera local `+Z` in world space (points away from the view).
    pub fn z_axis(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Distance in front of the camera; negative behind it.
    pub fn depth(&self, point: Vec3) -> f32 {
        -self.view_matrix().transform_point3(point).z
    }

    /// Projects a world point to pixel coordinates (origin top left).
    pub fn project_to_screen(&self, point: Vec3, width: f32, height: f32) -> Vec2 {
        let ndc = self.view_proj().project_point3(point);
        Vec2::new((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height)
    }
}
