//! Per-frame drawing context

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dimkit_core::config::EngineConfig;
use dimkit_core::style::Style;
use dimkit_core::view::{View, drawing_resolution, drawing_scale};

use crate::camera::Camera;

/// What a frame is being drawn for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameMode {
    /// Interactive redraw
    #[default]
    Viewport,
    /// Render to image
    Render,
    /// Render to image and mirror every emission to a drawing surface
    Vector,
}

/// Everything the drawing passes read about the current frame.
#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Draw mode.
    pub mode: FrameMode,
    /// Active viewport or scene camera.
    pub camera: Camera,
    /// Viewport size in pixels.
    pub viewport: [f32; 2],
    /// Current view layer name, matched against `Style::visible_in_view`.
    pub view_layer: String,
    /// The view changed since the last frame (invalidates silhouettes).
    pub view_changed: bool,
    /// Selected objects.
    pub selected: Vec<Uuid>,
    /// Active object.
    pub active: Option<Uuid>,
    /// Engine configuration.
    pub config: EngineConfig,
    /// Active view, if any.
    pub view: Option<View>,
    /// Model units per paper unit.
    pub scale: f32,
    /// Pixels per inch.
    pub resolution: u32,
    /// Global batch epoch; see `Engine::clear_batches`.
    pub batch_epoch: u64,
}

impl FrameContext {
    /// Builds a context, deriving scale and resolution from the view.
    pub fn new(mode: FrameMode, camera: Camera, config: EngineConfig, view: Option<View>) -> Self {
        let scale = drawing_scale(view.as_ref(), &config);
        let resolution = drawing_resolution(view.as_ref(), &config);
        Self {
            mode,
            camera,
            viewport: [1920.0, 1080.0],
            view_layer: String::new(),
            view_changed: false,
            selected: Vec::new(),
            active: None,
            config,
            view,
            scale,
            resolution,
            batch_epoch: 0,
        }
    }

    /// Rendering to an image (raster or vector).
    pub fn is_render(&self) -> bool {
        matches!(self.mode, FrameMode::Render | FrameMode::Vector)
    }

    /// Mirroring emissions to a drawing surface.
    pub fn is_vector(&self) -> bool {
        self.mode == FrameMode::Vector
    }

    /// Orientation used to keep text legible.
    pub fn view_rotation(&self) -> Quat {
        self.camera.rotation
    }

    /// Direction from the scene towards the viewer.
    pub fn view_axis(&self) -> Vec3 {
        self.camera.z_axis()
    }

    /// Combined item and style visibility.
    pub fn is_visible(&self, item_visible: bool, style: &Style) -> bool {
        let in_view = match style.visible_in_view.as_deref() {
            None | Some("") => true,
            Some(layer) => layer == self.view_layer,
        };
        item_visible && style.visible && in_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_combines_item_style_and_layer() {
        let mut frame = FrameContext::new(
            FrameMode::Viewport,
            Camera::default(),
            EngineConfig::default(),
            None,
        );
        frame.view_layer = "Plan".into();

        let mut style = Style::default();
        assert!(frame.is_visible(true, &style));
        assert!(!frame.is_visible(false, &style));

        style.visible_in_view = Some("Section".into());
        assert!(!frame.is_visible(true, &style));
        style.visible_in_view = Some("Plan".into());
        assert!(frame.is_visible(true, &style));

        style.visible = false;
        assert!(!frame.is_visible(true, &style));
    }

    #[test]
    fn test_modes() {
        let frame = FrameContext::new(
            FrameMode::Vector,
            Camera::default(),
            EngineConfig::default(),
            None,
        );
        assert!(frame.is_render());
        assert!(frame.is_vector());
        assert_eq!(frame.scale, 1.0);
    }
}
