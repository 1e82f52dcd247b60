//! Land-cover classification and lot economics.

use super::params::FeatureParams;
use crate::lot::{LandType, Lot};

/// Assign the land type from mean indices. Order matters: water is tested
/// before any vegetation threshold, so a lot with NDWI above the water
/// threshold is water regardless of its NDVI.
pub fn classify(avg_ndvi: f64, avg_ndwi: f64, params: &FeatureParams) -> LandType {
    if avg_ndwi > params.water_ndwi {
        LandType::Water
    } else if avg_ndvi > params.forest_ndvi {
        LandType::Forest
    } else if avg_ndvi < params.bare_ndvi {
        LandType::Bare
    } else {
        LandType::Shrub
    }
}

/// Fraction of nominal energy a lot can yield. Water yields nothing;
/// otherwise denser vegetation lowers the yield, and negative NDVI is
/// treated as bare (full efficiency).
pub fn efficiency(land_type: LandType, avg_ndvi: f64) -> f64 {
    if land_type.is_water() {
        0.0
    } else {
        (1.0 - avg_ndvi.max(0.0)).max(0.0)
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Build the lot record for one region from its pixel count and unrounded
/// mean indices.
pub fn score_lot(id: u32, area: u64, avg_ndvi: f64, avg_ndwi: f64, params: &FeatureParams) -> Lot {
    let land_type = classify(avg_ndvi, avg_ndwi, params);
    let cost = (area as f64 * params.unit_cost(land_type)).trunc() as u64;
    let energy = area as f64 * params.energy_per_pixel * efficiency(land_type, avg_ndvi);

    Lot {
        id,
        land_type,
        is_water: land_type.is_water(),
        energy: round_to(energy, params.energy_decimals),
        cost,
        area,
        ndvi: round_to(avg_ndvi, params.index_decimals),
        ndwi: round_to(avg_ndwi, params.index_decimals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn water_wins_over_high_ndvi() {
        let p = FeatureParams::default();
        assert_eq!(classify(0.8, 0.01, &p), LandType::Water);
    }

    #[test]
    fn vegetation_thresholds_are_strict() {
        let p = FeatureParams::default();
        assert_eq!(classify(0.41, -0.3, &p), LandType::Forest);
        assert_eq!(classify(0.4, -0.3, &p), LandType::Shrub);
        assert_eq!(classify(0.1, -0.3, &p), LandType::Shrub);
        assert_eq!(classify(0.09, -0.3, &p), LandType::Bare);
        // NDWI exactly at the threshold is not water.
        assert_eq!(classify(0.2, 0.0, &p), LandType::Shrub);
    }

    #[test]
    fn cost_follows_unit_table() {
        let p = FeatureParams::default();
        assert_eq!(score_lot(0, 10, 0.5, -0.2, &p).cost, 2000);
        assert_eq!(score_lot(1, 10, 0.05, -0.2, &p).cost, 500);
        assert_eq!(score_lot(2, 10, 0.2, -0.2, &p).cost, 1000);
        assert_eq!(score_lot(3, 10, 0.2, 0.3, &p).cost, 1000);
    }

    #[test]
    fn energy_formula() {
        let p = FeatureParams::default();
        let shrub = score_lot(0, 20, 0.25, -0.1, &p);
        assert_abs_diff_eq!(shrub.energy, 20.0 * 10.0 * 0.75, epsilon = 1e-9);

        // Negative NDVI contributes full efficiency.
        let bare = score_lot(1, 20, -0.3, -0.1, &p);
        assert_abs_diff_eq!(bare.energy, 200.0, epsilon = 1e-9);

        let water = score_lot(2, 20, -0.3, 0.4, &p);
        assert!(water.is_water);
        assert_eq!(water.energy, 0.0);
    }

    #[test]
    fn indices_rounded_but_classification_uses_raw() {
        let p = FeatureParams::default();
        // 0.40004 rounds to 0.4 but is still strictly above the forest threshold.
        let lot = score_lot(7, 3, 0.40004, -0.12345, &p);
        assert_eq!(lot.land_type, LandType::Forest);
        assert_eq!(lot.ndvi, 0.4);
        assert_eq!(lot.ndwi, -0.123);
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(123.456, 2), 123.46);
        assert_eq!(round_to(-0.0004, 3), -0.0);
    }
}
