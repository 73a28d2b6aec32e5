//! Step settings and precision presets
//!
//! Loaded from JSON by hosts that want to tune the engine without a rebuild.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{PhysicsError, Result};

/// Precision preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PrecisionPreset {
    Fast,
    #[default]
    Balanced,
    Precise,
}

impl PrecisionPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecisionPreset::Fast => "Fast",
            PrecisionPreset::Balanced => "Balanced",
            PrecisionPreset::Precise => "Precise",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Some(PrecisionPreset::Fast),
            "balanced" | "default" => Some(PrecisionPreset::Balanced),
            "precise" => Some(PrecisionPreset::Precise),
            _ => None,
        }
    }

    /// Substep cap for this preset. `None` runs every substep a body asks for.
    pub fn max_substeps(&self) -> Option<u32> {
        match self {
            PrecisionPreset::Fast => Some(FAST_MAX_SUBSTEPS),
            PrecisionPreset::Balanced | PrecisionPreset::Precise => None,
        }
    }

    /// Quad-tree depth for this preset
    pub fn quadtree_max_levels(&self) -> u32 {
        match self {
            PrecisionPreset::Fast => 3,
            PrecisionPreset::Balanced => QUADTREE_MAX_LEVELS,
            PrecisionPreset::Precise => 8,
        }
    }
}

/// Tunable parameters read by every step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub preset: PrecisionPreset,

    // === Broad phase ===
    /// Items a quad-tree node holds before it subdivides
    pub quadtree_capacity: usize,
    /// Deepest quad-tree level; nodes at this level never subdivide
    pub quadtree_max_levels: u32,
    /// Padding around a body's AABB when querying candidates
    pub query_padding: f32,

    // === Integration ===
    /// Optional upper bound on substeps per body per step. A capped body
    /// moves further per substep than its move ratio allows and can tunnel.
    pub max_substeps: Option<u32>,
    /// Nudge along the contact normal after a swept hit
    pub ccd_epsilon: f32,

    // === Diagnostics ===
    /// Warn when a logic hook moves its body instead of setting velocity
    pub warn_on_logic_movement: bool,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            preset: PrecisionPreset::Balanced,

            quadtree_capacity: QUADTREE_CAPACITY,
            quadtree_max_levels: QUADTREE_MAX_LEVELS,
            query_padding: QUERY_PADDING,

            max_substeps: None,
            ccd_epsilon: CCD_EPSILON,

            warn_on_logic_movement: true,
        }
    }
}

impl PhysicsSettings {
    /// Create settings from a precision preset (applies preset defaults)
    pub fn from_preset(preset: PrecisionPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a precision preset (updates preset-dependent settings)
    pub fn apply_preset(&mut self, preset: PrecisionPreset) {
        self.preset = preset;
        self.max_substeps = preset.max_substeps();
        self.quadtree_max_levels = preset.quadtree_max_levels();
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        log::debug!("Loaded physics settings ({})", settings.preset.as_str());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quadtree_capacity == 0 {
            return Err(PhysicsError::InvalidSettings(
                "quadtree_capacity must be at least 1".into(),
            ));
        }
        if self.max_substeps == Some(0) {
            return Err(PhysicsError::InvalidSettings(
                "max_substeps must be at least 1".into(),
            ));
        }
        if !self.query_padding.is_finite() || self.query_padding < 0.0 {
            return Err(PhysicsError::InvalidSettings(format!(
                "query_padding must be finite and non-negative, got {}",
                self.query_padding
            )));
        }
        if !self.ccd_epsilon.is_finite() || self.ccd_epsilon < 0.0 {
            return Err(PhysicsError::InvalidSettings(format!(
                "ccd_epsilon must be finite and non-negative, got {}",
                self.ccd_epsilon
            )));
        }
        Ok(())
    }
}
