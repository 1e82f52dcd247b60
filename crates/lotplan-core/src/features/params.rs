use serde::{Deserialize, Serialize};

use crate::error::{LotplanError, Result};
use crate::lot::LandType;

/// Thresholds and economics used to turn lot statistics into a `Lot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Added to index denominators.
    pub epsilon: f64,
    /// Mean NDWI strictly above this marks the lot as water.
    pub water_ndwi: f64,
    /// Mean NDVI strictly above this marks forest.
    pub forest_ndvi: f64,
    /// Mean NDVI strictly below this marks bare ground.
    pub bare_ndvi: f64,
    /// Cost per pixel, by land type.
    pub unit_cost_forest: f64,
    pub unit_cost_bare: f64,
    /// Water and shrub lots.
    pub unit_cost_other: f64,
    /// Energy per pixel at full efficiency.
    pub energy_per_pixel: f64,
    /// Decimal places kept for `energy`.
    pub energy_decimals: u32,
    /// Decimal places kept for `ndvi` and `ndwi`.
    pub index_decimals: u32,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            water_ndwi: 0.0,
            forest_ndvi: 0.4,
            bare_ndvi: 0.1,
            unit_cost_forest: 200.0,
            unit_cost_bare: 50.0,
            unit_cost_other: 100.0,
            energy_per_pixel: 10.0,
            energy_decimals: 2,
            index_decimals: 3,
        }
    }
}

impl FeatureParams {
    pub fn unit_cost(&self, land_type: LandType) -> f64 {
        match land_type {
            LandType::Forest => self.unit_cost_forest,
            LandType::Bare => self.unit_cost_bare,
            LandType::Water | LandType::Shrub => self.unit_cost_other,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon >= 0.0) {
            return Err(LotplanError::InvalidParameter {
                name: "epsilon",
                reason: format!("must be >= 0, got {}", self.epsilon),
            });
        }
        if self.bare_ndvi > self.forest_ndvi {
            return Err(LotplanError::InvalidParameter {
                name: "bare_ndvi",
                reason: format!(
                    "bare threshold {} exceeds forest threshold {}",
                    self.bare_ndvi, self.forest_ndvi
                ),
            });
        }
        let costs = [
            ("unit_cost_forest", self.unit_cost_forest),
            ("unit_cost_bare", self.unit_cost_bare),
            ("unit_cost_other", self.unit_cost_other),
            ("energy_per_pixel", self.energy_per_pixel),
        ];
        for (name, v) in costs {
            if !(v.is_finite() && v >= 0.0) {
                return Err(LotplanError::InvalidParameter {
                    name,
                    reason: format!("must be a finite non-negative number, got {v}"),
                });
            }
        }
        Ok(())
    }
}
