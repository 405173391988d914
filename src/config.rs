use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::drawing::ToolSettings;

/// Tunable behavior of an [`crate::Annotator`]. Every field has a default, so
/// a partial JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotatorConfig {
    /// Rectangles need both sides, circles their radius, strictly above this.
    pub min_shape_size: f64,
    pub hit_tolerance_floor: f64,
    /// Arrow-key nudge distance in pixels.
    pub nudge_step: f64,
    pub scroll_throttle_ms: u64,
    pub handle_size: f64,
    pub selection_color: String,
    /// Fill opacity relative to the shape's own opacity.
    pub fill_alpha: f32,
    pub defaults: ToolSettings,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            min_shape_size: 5.0,
            hit_tolerance_floor: crate::hit_test::DEFAULT_TOLERANCE_FLOOR,
            nudge_step: 1.0,
            scroll_throttle_ms: 16,
            handle_size: 8.0,
            selection_color: "#1e88e5".to_string(),
            fill_alpha: 0.25,
            defaults: ToolSettings::default(),
        }
    }
}

impl AnnotatorConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut config: AnnotatorConfig =
            serde_json::from_str(json).context("Invalid annotator config")?;
        config.defaults = config.defaults.clamped();
        config.fill_alpha = config.fill_alpha.clamp(0.0, 1.0);
        Ok(config)
    }

    /// Reads the file named by `ANNOTATOR_CONFIG`, falling back to defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var("ANNOTATOR_CONFIG") else {
            return Self::default();
        };

        let loaded = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {path}"))
            .and_then(|json| Self::from_json(&json));

        match loaded {
            Ok(config) => {
                log::info!("Loaded annotator config from {}", path);
                config
            }
            Err(e) => {
                log::error!("{:#}; using default config", e);
                Self::default()
            }
        }
    }
}
