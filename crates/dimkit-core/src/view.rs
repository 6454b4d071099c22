//! Views (camera + paper configurations)
//!
//! The active view decides how scale-dependent sizes (endcaps, fonts, line
//! weights) map from paper to model space.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::text::TextField;

/// How a view's output resolution is specified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionType {
    /// Paper size and pixels per inch
    #[default]
    Paper,
    /// Raw pixel dimensions
    Pixels,
}

/// Camera settings a view needs for scale decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewCamera {
    pub ortho: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct View {
    pub name: String,
    /// Sheet number shown in title blocks
    pub view_num: String,
    pub camera: Option<ViewCamera>,
    pub res_type: ResolutionType,
    pub paper_scale: f32,
    pub model_scale: f32,
    /// Pixels per inch
    pub res: u32,
    /// Free-form notes, spawned by annotations with a notes text source
    pub notes: Vec<TextField>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            name: String::new(),
            view_num: String::new(),
            camera: None,
            res_type: ResolutionType::Paper,
            paper_scale: 1.0,
            model_scale: 1.0,
            res: crate::constants::DEFAULT_RESOLUTION,
            notes: Vec::new(),
        }
    }
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn is_paper(&self) -> bool {
        self.res_type == ResolutionType::Paper
    }

    /// `paper:model` label used by scale text sources.
    pub fn scale_label(&self) -> String {
        format!("{}:{}", self.paper_scale, self.model_scale)
    }
}

/// Model units per paper unit for the active view.
///
/// Only an orthographic paper view overrides the configured default.
pub fn drawing_scale(view: Option<&View>, config: &EngineConfig) -> f32 {
    match view {
        Some(view)
            if view.is_paper()
                && view.camera.is_some_and(|c| c.ortho)
                && view.paper_scale != 0.0 =>
        {
            view.model_scale / view.paper_scale
        }
        _ => config.default_scale,
    }
}

/// Pixels per inch for the active view.
pub fn drawing_resolution(view: Option<&View>, config: &EngineConfig) -> u32 {
    match view {
        Some(view) if view.is_paper() && view.camera.is_some() => view.res,
        _ => config.default_resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper_view(ortho: bool) -> View {
        View {
            camera: Some(ViewCamera { ortho }),
            paper_scale: 1.0,
            model_scale: 50.0,
            res: 300,
            ..View::new("Plan")
        }
    }

    #[test]
    fn test_scale_from_ortho_paper_view() {
        let config = EngineConfig::default();
        assert_eq!(drawing_scale(Some(&paper_view(true)), &config), 50.0);
        assert_eq!(
            drawing_scale(Some(&paper_view(false)), &config),
            config.default_scale
        );
        assert_eq!(drawing_scale(None, &config), config.default_scale);
    }

    #[test]
    fn test_resolution_requires_camera() {
        let config = EngineConfig::default();
        assert_eq!(drawing_resolution(Some(&paper_view(false)), &config), 300);
        let no_camera = View::new("Loose");
        assert_eq!(
            drawing_resolution(Some(&no_camera), &config),
            config.default_resolution
        );
    }

    #[test]
    fn test_scale_label() {
        assert_eq!(paper_view(true).scale_label(), "1:50");
    }
}
