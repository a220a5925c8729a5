use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    #[default]
    Hierarchical,
    Radial,
}

impl LayoutAlgorithm {
    pub fn label(self) -> &'static str {
        match self {
            Self::Hierarchical => "hierarchical",
            Self::Radial => "radial",
        }
    }
}

/// How flow particles lose visibility over their lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FadePolicy {
    /// Alpha never changes; particles leave only through the cap or by
    /// staying off screen.
    #[default]
    Constant,
    /// Alpha decays every frame and the particle is dropped near zero.
    Decaying,
}

/// What a focus change does to the current transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTransition {
    /// Fit the new sub-tree into the container.
    #[default]
    DrillIn,
    /// Keep pan and zoom as they are.
    Refresh,
}

/// Source of relation strengths when a relation carries no usable score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthFallback {
    Fixed(f32),
    /// Integer in `[1, 10]` drawn from a generator seeded per build, so
    /// rebuilding the same document yields the same strengths.
    Seeded(u64),
    /// Integer in `[1, 10]` from the thread RNG; differs between builds.
    Random,
}

impl Default for StrengthFallback {
    fn default() -> Self {
        Self::Seeded(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self { min: 0.1, max: 10.0 }
    }
}

impl ZoomBounds {
    pub fn clamp(self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpacing {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for NodeSpacing {
    fn default() -> Self {
        Self {
            horizontal: 120.0,
            vertical: 150.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout_algorithm: LayoutAlgorithm,
    pub particle_cap: usize,
    pub particle_spawn_rate: f32,
    pub particle_seed: Option<u64>,
    pub fade_policy: FadePolicy,
    pub zoom_bounds: ZoomBounds,
    pub auto_collapse_delay_ms: u64,
    pub focus_transition: FocusTransition,
    pub strength_fallback: StrengthFallback,
    pub containment_kind: String,
    pub node_spacing: NodeSpacing,
    pub radial_base_radius: f32,
    pub fit_padding: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout_algorithm: LayoutAlgorithm::default(),
            particle_cap: 1000,
            particle_spawn_rate: 0.02,
            particle_seed: None,
            fade_policy: FadePolicy::default(),
            zoom_bounds: ZoomBounds::default(),
            auto_collapse_delay_ms: 0,
            focus_transition: FocusTransition::default(),
            strength_fallback: StrengthFallback::default(),
            containment_kind: "Child".to_owned(),
            node_spacing: NodeSpacing::default(),
            radial_base_radius: 90.0,
            fit_padding: 40.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|error| Error::io(path, error))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let bounds = self.zoom_bounds;
        if !(bounds.min > 0.0) || !bounds.max.is_finite() {
            return Err(Error::config(format!(
                "zoom bounds must be positive and finite, got {}..{}",
                bounds.min, bounds.max
            )));
        }
        if bounds.min > bounds.max {
            return Err(Error::config(format!(
                "zoom bounds are inverted: min {} > max {}",
                bounds.min, bounds.max
            )));
        }
        let spacing = self.node_spacing;
        if !(spacing.horizontal > 0.0) || !spacing.horizontal.is_finite() {
            return Err(Error::config(format!(
                "horizontal node spacing must be positive and finite, got {}",
                spacing.horizontal
            )));
        }
        if !spacing.vertical.is_finite() {
            return Err(Error::config("vertical node spacing must be finite"));
        }
        if !(self.radial_base_radius > 0.0) || !self.radial_base_radius.is_finite() {
            return Err(Error::config(format!(
                "radial base radius must be positive and finite, got {}",
                self.radial_base_radius
            )));
        }
        if !(self.fit_padding >= 0.0) || !self.fit_padding.is_finite() {
            return Err(Error::config(format!(
                "fit padding must be non-negative and finite, got {}",
                self.fit_padding
            )));
        }
        if !(self.particle_spawn_rate >= 0.0) {
            return Err(Error::config("particle spawn rate must be non-negative"));
        }
        if self.containment_kind.trim().is_empty() {
            return Err(Error::config("containment kind must not be empty"));
        }
        if let StrengthFallback::Fixed(value) = self.strength_fallback
            && !(value > 0.0)
        {
            return Err(Error::config("fixed fallback strength must be positive"));
        }
        Ok(())
    }
}
