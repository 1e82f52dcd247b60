//! Per-pixel spectral indices.
//!
//! Both indices are normalized differences with a small epsilon in the
//! denominator, so an all-zero pixel yields 0 rather than NaN.

use crate::error::Result;
use crate::raster::BandRaster;

/// `(a - b) / (a + b + epsilon)` cell by cell. `a` and `b` must share a grid.
pub fn normalized_difference(a: &BandRaster, b: &BandRaster, epsilon: f64) -> Result<BandRaster> {
    a.check_shape(b, "second band")?;
    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&x, &y)| (x - y) / (x + y + epsilon))
        .collect();
    BandRaster::from_vec(data, a.width, a.height)
}

/// Normalized Difference Vegetation Index: `(nir - red) / (nir + red + ε)`.
pub fn ndvi(nir: &BandRaster, red: &BandRaster, epsilon: f64) -> Result<BandRaster> {
    normalized_difference(nir, red, epsilon)
}

/// Normalized Difference Water Index (McFeeters): `(green - nir) / (green + nir + ε)`.
/// Positive values indicate open water.
pub fn ndwi(green: &BandRaster, nir: &BandRaster, epsilon: f64) -> Result<BandRaster> {
    normalized_difference(green, nir, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn band(vals: &[f64]) -> BandRaster {
        BandRaster::from_vec(vals.to_vec(), vals.len(), 1).unwrap()
    }

    #[test]
    fn ndvi_dense_vegetation_is_high() {
        let nir = band(&[0.5, 0.3]);
        let red = band(&[0.05, 0.3]);
        let v = ndvi(&nir, &red, 1e-6).unwrap();
        assert_abs_diff_eq!(v.data[0], 0.45 / 0.55, epsilon = 1e-5);
        assert_abs_diff_eq!(v.data[1], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_pixel_is_finite() {
        let z = band(&[0.0]);
        let v = ndwi(&z, &z, 1e-6).unwrap();
        assert_eq!(v.data[0], 0.0);
    }

    #[test]
    fn ndwi_water_is_positive() {
        let green = band(&[800.0]);
        let nir = band(&[200.0]);
        let v = ndwi(&green, &nir, 1e-6).unwrap();
        assert!(v.data[0] > 0.5);
    }

    #[test]
    fn mismatched_bands_error() {
        let a = band(&[1.0, 2.0]);
        let b = band(&[1.0]);
        assert!(normalized_difference(&a, &b, 1e-6).is_err());
    }
}
