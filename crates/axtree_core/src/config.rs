//! Viewer configuration.
//!
//! Loaded once from `config/viewer_settings.yaml` (or the file named by
//! `AXTREE_CONFIG`) through [`global_config()`]. Every field has a default so
//! a partial or missing file still yields a complete configuration.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use axtree_snapshot::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "AXTREE_CONFIG";

/// Settings file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/viewer_settings.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be zero or more, got {value}")))
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(invalid(field, format!("minimum {min} exceeds maximum {max}")))
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Subtracted from the canvas height to get the sibling-axis extent.
    pub breadth_margin: f32,
    /// Subtracted from the canvas width to get the depth-axis extent.
    pub depth_margin: f32,
    pub sibling_separation: f32,
    pub cousin_separation: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            breadth_margin: 80.0,
            depth_margin: 260.0,
            sibling_separation: 1.0,
            cousin_separation: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Total padding added to the layout bounds before fitting.
    pub fit_padding: f32,
    pub fit_duration_ms: u64,
    pub focus_scale: f32,
    pub focus_duration_ms: u64,
    /// Scale factor per wheel unit: `exp(delta * sensitivity)`.
    pub wheel_zoom_sensitivity: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 4.0,
            fit_padding: 120.0,
            fit_duration_ms: 600,
            focus_scale: 1.2,
            focus_duration_ms: 700,
            wheel_zoom_sensitivity: 0.002,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    /// Fraction of the canvas the overview tries to occupy.
    pub ratio: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub inset: f32,
    pub node_radius: f32,
    pub highlight_radius: f32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            ratio: 0.12,
            min_width: 180.0,
            max_width: 320.0,
            min_height: 120.0,
            max_height: 200.0,
            inset: 6.0,
            node_radius: 2.5,
            highlight_radius: 3.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub auto_focus_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            auto_focus_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub step_delay_ms: u64,
    /// How long a playback highlight stays visible on a node.
    pub flash_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 700,
            flash_ms: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub duplicate_ids: DuplicatePolicy,
}

// =============================================================================
// ROOT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub canvas: CanvasConfig,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    pub minimap: MinimapConfig,
    pub search: SearchConfig,
    pub playback: PlaybackConfig,
    pub snapshot: SnapshotConfig,
}

impl ViewerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the viewport and overview cannot work with: clamp
    /// ranges must be ordered and scales strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("canvas.width", self.canvas.width)?;
        positive("canvas.height", self.canvas.height)?;

        let layout = &self.layout;
        non_negative("layout.breadth_margin", layout.breadth_margin)?;
        non_negative("layout.depth_margin", layout.depth_margin)?;
        positive("layout.sibling_separation", layout.sibling_separation)?;
        positive("layout.cousin_separation", layout.cousin_separation)?;

        let viewport = &self.viewport;
        positive("viewport.min_scale", viewport.min_scale)?;
        positive("viewport.max_scale", viewport.max_scale)?;
        ordered("viewport.min_scale", viewport.min_scale, viewport.max_scale)?;
        positive("viewport.focus_scale", viewport.focus_scale)?;
        non_negative("viewport.fit_padding", viewport.fit_padding)?;
        non_negative("viewport.wheel_zoom_sensitivity", viewport.wheel_zoom_sensitivity)?;

        let minimap = &self.minimap;
        positive("minimap.ratio", minimap.ratio)?;
        positive("minimap.min_width", minimap.min_width)?;
        positive("minimap.min_height", minimap.min_height)?;
        ordered("minimap.min_width", minimap.min_width, minimap.max_width)?;
        ordered("minimap.min_height", minimap.min_height, minimap.max_height)?;
        non_negative("minimap.node_radius", minimap.node_radius)?;
        non_negative("minimap.highlight_radius", minimap.highlight_radius)?;
        non_negative("minimap.inset", minimap.inset)?;
        if minimap.inset < minimap.highlight_radius {
            return Err(invalid(
                "minimap.inset",
                format!(
                    "must be at least highlight_radius ({}), got {}",
                    minimap.highlight_radius, minimap.inset
                ),
            ));
        }
        if 2.0 * minimap.inset >= minimap.min_width.min(minimap.min_height) {
            return Err(invalid(
                "minimap.inset",
                format!("{} leaves no room inside the smallest footprint", minimap.inset),
            ));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Resolve the settings path from the environment, falling back to
    /// defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        if !path.exists() {
            debug!(path = %path.display(), "no viewer settings file, using defaults");
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "failed to load viewer settings, using defaults");
                Self::default()
            }
        }
    }
}

static CONFIG: OnceLock<ViewerConfig> = OnceLock::new();

/// Process-wide configuration, loaded on first use.
pub fn global_config() -> &'static ViewerConfig {
    CONFIG.get_or_init(ViewerConfig::load)
}
