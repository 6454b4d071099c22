//! Engine configuration
//!
//! Scene-wide switches the drawing passes consult every frame. Loaded from
//! and saved to RON, like project files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RESOLUTION, DEFAULT_SCALE};
use crate::error::ConfigError;
use crate::units::UnitSettings;

/// Highlight colours for selected items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    /// Items on selected objects (RGBA)
    pub object_selected: [f32; 4],
    /// Items on the active object (RGBA)
    pub object_active: [f32; 4],
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            object_selected: [0.95, 0.45, 0.1, 1.0],
            object_active: [1.0, 0.63, 0.16, 1.0],
        }
    }
}

/// Debug overlays
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Outline every text card
    pub show_text_cards: bool,
    /// Draw card and view axes used by text auto-flip
    pub flip_text: bool,
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Drawing scale when no paper view applies
    pub default_scale: f32,
    /// Pixels per inch when no paper view applies
    pub default_resolution: u32,
    pub show_dim_text: bool,
    /// Move text outside the dimension line when it does not fit
    pub use_text_autoplacement: bool,
    /// Evaluate modifiers for every item regardless of its style
    pub eval_mods: bool,
    /// Draw aligned, angle and axis dimensions on instances
    pub instance_dims: bool,
    pub hide_linework: bool,
    pub highlight_selected: bool,
    pub units: UnitSettings,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_scale: DEFAULT_SCALE,
            default_resolution: DEFAULT_RESOLUTION,
            show_dim_text: true,
            use_text_autoplacement: true,
            eval_mods: false,
            instance_dims: false,
            hide_linework: false,
            highlight_selected: true,
            units: UnitSettings::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Save config to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitSystem;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron("(default_scale: 2.0, debug: (show_text_cards: true))")
            .unwrap();
        assert_eq!(config.default_scale, 2.0);
        assert!(config.debug.show_text_cards);
        assert_eq!(config.default_resolution, DEFAULT_RESOLUTION);
        assert!(config.show_dim_text);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");

        let mut config = EngineConfig::new();
        config.instance_dims = true;
        config.units.system = UnitSystem::Imperial;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_ron() {
        assert!(matches!(
            EngineConfig::from_ron("(default_scale: \"big\")"),
            Err(ConfigError::Parse(_))
        ));
    }
}
