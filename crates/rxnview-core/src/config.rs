//! Canvas configuration for rxnview
//!
//! Policy constants of the interaction engine, grouped into sections:
//! - Viewport (zoom range, zoom step, pan limits)
//! - Reaction handles (clamp margin, hit radius)
//! - Resizing (resize-square size, minimum element sizes)
//! - Reaction curves (hit slack, sampling)
//! - Minimap placement
//! - Scene limits (world bounds, paste offset)
//!
//! Every section deserializes with defaults, so a partial TOML file only
//! needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::geometry::Bounds;

/// Zoom and pan policy for a viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Smallest allowed device units per logical unit
    pub min_scale: f64,
    /// Largest allowed device units per logical unit
    pub max_scale: f64,
    /// Multiplicative factor applied by one zoom step
    pub zoom_step: f64,
    /// Padding in device pixels used by fit-to-view
    pub fit_padding: f64,
    /// Logical region the visible area may not scroll beyond
    pub pan_limits: Option<Bounds>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 1.2,
            fit_padding: 20.0,
            pan_limits: None,
        }
    }
}

/// Reaction handle policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// Logical margin added around the endpoint bounding box before clamping
    pub clamp_margin: f64,
    /// Drawn radius of a handle, in device pixels
    pub hit_radius: f64,
    /// Extra pick tolerance around a handle, in device pixels
    pub hit_buffer: f64,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            clamp_margin: 0.0,
            hit_radius: 3.0,
            hit_buffer: 2.0,
        }
    }
}

impl HandleConfig {
    /// Total pick radius in device pixels.
    pub fn pick_radius(&self) -> f64 {
        self.hit_radius + self.hit_buffer
    }
}

/// Resize policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Side of each resize square, in device pixels
    pub corner_size: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
    pub min_compartment_width: f64,
    pub min_compartment_height: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            corner_size: 8.0,
            min_node_width: 20.0,
            min_node_height: 15.0,
            min_compartment_width: 350.0,
            min_compartment_height: 200.0,
        }
    }
}

/// Reaction curve policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Distance-to-segment pick threshold, in device pixels
    pub curve_slack: f64,
    /// Number of straight segments each Bezier is sampled into
    pub curve_segments: usize,
    /// Logical gap between a node's border and the start of its curve
    pub node_edge_gap: f64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            curve_slack: 5.0,
            curve_segments: 29,
            node_edge_gap: 4.0,
        }
    }
}

/// Minimap placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub enabled: bool,
    /// Width in device pixels
    pub width: f64,
    /// Height in device pixels
    pub height: f64,
    /// Distance from the bottom-right corner of the main viewport
    pub margin: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 200.0,
            height: 150.0,
            margin: 10.0,
        }
    }
}

/// Scene-wide limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Logical world rectangle that nodes and compartments must stay inside
    pub bounds: Option<Bounds>,
    /// Logical offset applied to pasted elements
    pub paste_offset: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            paste_offset: 20.0,
        }
    }
}

/// Complete canvas configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub viewport: ViewportConfig,
    pub handles: HandleConfig,
    pub resize: ResizeConfig,
    pub reactions: ReactionConfig,
    pub minimap: MinimapConfig,
    pub scene: SceneConfig,
}

impl CanvasConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded canvas config from {}", path.display());
        Ok(config)
    }

    /// Validate and write this configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// Every float must be finite. TOML accepts `nan` and `inf`, and either
    /// would reach `f64::clamp` in the viewport and the handle limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.viewport;
        positive("viewport.min_scale", v.min_scale)?;
        finite("viewport.max_scale", v.max_scale)?;
        if v.max_scale < v.min_scale {
            return Err(ConfigError::invalid(
                "viewport.max_scale",
                "must be >= viewport.min_scale",
            ));
        }
        finite("viewport.zoom_step", v.zoom_step)?;
        if v.zoom_step <= 1.0 {
            return Err(ConfigError::invalid("viewport.zoom_step", "must be > 1"));
        }
        non_negative("viewport.fit_padding", v.fit_padding)?;
        if let Some(limits) = &v.pan_limits {
            area("viewport.pan_limits", limits)?;
        }

        let h = &self.handles;
        non_negative("handles.clamp_margin", h.clamp_margin)?;
        positive("handles.hit_radius", h.hit_radius)?;
        non_negative("handles.hit_buffer", h.hit_buffer)?;

        let r = &self.resize;
        positive("resize.corner_size", r.corner_size)?;
        positive("resize.min_node_width", r.min_node_width)?;
        positive("resize.min_node_height", r.min_node_height)?;
        positive("resize.min_compartment_width", r.min_compartment_width)?;
        positive("resize.min_compartment_height", r.min_compartment_height)?;

        if self.reactions.curve_segments == 0 {
            return Err(ConfigError::invalid(
                "reactions.curve_segments",
                "must be at least 1",
            ));
        }
        positive("reactions.curve_slack", self.reactions.curve_slack)?;
        non_negative("reactions.node_edge_gap", self.reactions.node_edge_gap)?;

        positive("minimap.width", self.minimap.width)?;
        positive("minimap.height", self.minimap.height)?;
        non_negative("minimap.margin", self.minimap.margin)?;

        finite("scene.paste_offset", self.scene.paste_offset)?;
        if let Some(bounds) = &self.scene.bounds {
            area("scene.bounds", bounds)?;
            if bounds.width() < r.min_node_width || bounds.height() < r.min_node_height {
                return Err(ConfigError::invalid(
                    "scene.bounds",
                    "must fit at least one minimum-size node",
                ));
            }
        }

        Ok(())
    }
}

fn finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, "must be a finite number"))
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    finite(key, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, "must be > 0"))
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    finite(key, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, "must be >= 0"))
    }
}

fn area(key: &str, bounds: &Bounds) -> Result<(), ConfigError> {
    for value in [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y] {
        finite(key, value)?;
    }
    if bounds.is_degenerate() {
        return Err(ConfigError::invalid(key, "must have non-zero area"));
    }
    Ok(())
}

impl std::fmt::Display for CanvasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "zoom {}..{} step {}, handle margin {}, resize square {}px, minimap {}",
            self.viewport.min_scale,
            self.viewport.max_scale,
            self.viewport.zoom_step,
            self.handles.clamp_margin,
            self.resize.corner_size,
            if self.minimap.enabled { "on" } else { "off" }
        )
    }
}
