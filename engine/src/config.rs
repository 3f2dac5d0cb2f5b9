//! Sculpt Layer Configuration
//!
//! Centralized settings for a sculpt layer. `Default` returns the values a
//! freshly created layer starts with; the same struct round-trips through
//! JSON so layer presets can be stored next to a scene.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LayerError, Result};
use crate::geometry::grid::{DEFAULT_CELLS_PER_AXIS, MAX_CELLS_PER_AXIS};
use crate::layer::falloff::DistanceMetric;
use crate::layer::region::RegionGrowth;

/// Settings for one sculpt layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SculptLayerConfig {
    /// Global blend factor toward the sculpted mesh (1.0 = reach it)
    pub sculpt_strength: f32,
    /// Scale on the centre-to-face vector in the inside test (> 1 pulls the
    /// region boundary inward)
    pub curve_offset: f32,
    /// Longest projection ray (world units)
    pub max_projection_distance: f32,
    /// Flood-fill policy for faces failing the inside test
    pub region_growth: RegionGrowth,
    /// Distance form used by the falloff ratio
    pub distance_metric: DistanceMetric,
    /// Cast projection rays against the normal as well
    pub test_both_directions: bool,
    /// Ray-acceleration grid resolution along the longest axis
    pub grid_cells_per_axis: u32,
}

impl Default for SculptLayerConfig {
    fn default() -> Self {
        Self {
            sculpt_strength: 1.0,
            curve_offset: 1.1,
            max_projection_distance: 1000.0,
            region_growth: RegionGrowth::InsideOnly,
            distance_metric: DistanceMetric::Full3d,
            test_both_directions: false,
            grid_cells_per_axis: DEFAULT_CELLS_PER_AXIS,
        }
    }
}

impl SculptLayerConfig {
    /// Rejects values the layer cannot evaluate with.
    pub fn validate(&self) -> Result<()> {
        if !self.sculpt_strength.is_finite() {
            return Err(LayerError::invalid_config("sculpt_strength", "must be finite"));
        }
        if !(self.curve_offset.is_finite() && self.curve_offset > 0.0) {
            return Err(LayerError::invalid_config("curve_offset", "must be finite and positive"));
        }
        if !(self.max_projection_distance.is_finite() && self.max_projection_distance > 0.0) {
            return Err(LayerError::invalid_config(
                "max_projection_distance",
                "must be finite and positive",
            ));
        }
        if !(1..=MAX_CELLS_PER_AXIS).contains(&self.grid_cells_per_axis) {
            return Err(LayerError::invalid_config(
                "grid_cells_per_axis",
                format!("must be between 1 and {MAX_CELLS_PER_AXIS}"),
            ));
        }
        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), "loaded sculpt layer config");
        Ok(config)
    }

    /// Save the config to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_string()?)?;
        info!(path = %path.display(), "saved sculpt layer config");
        Ok(())
    }
}
