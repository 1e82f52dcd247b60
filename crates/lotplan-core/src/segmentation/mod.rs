//! Superpixel segmentation: partitions the scene into contiguous lots.
//!
//! The extractor only needs *some* capability that returns a label raster,
//! so segmentation sits behind the `Segmenter` trait. `Slic` is the built-in
//! implementation; a precomputed label raster can be wrapped in `Precomputed`.
pub mod connectivity;
pub mod slic;

use crate::error::Result;
use crate::features::SpectralBands;
use crate::raster::LabelRaster;
pub use slic::{Slic, SlicParams};

/// Anything that can turn a band stack into a label raster of the same shape.
pub trait Segmenter {
    fn segment(&self, bands: &SpectralBands) -> Result<LabelRaster>;
}

/// Label raster produced outside this crate (e.g. loaded from a TIFF).
#[derive(Debug, Clone)]
pub struct Precomputed(pub LabelRaster);

impl Segmenter for Precomputed {
    fn segment(&self, bands: &SpectralBands) -> Result<LabelRaster> {
        bands.red.check_shape(&self.0, "precomputed labels")?;
        Ok(self.0.clone())
    }
}

/// Number of distinct labels in a raster.
pub fn count_segments(labels: &LabelRaster) -> usize {
    let mut seen: Vec<u32> = labels.data.clone();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::BandRaster;

    #[test]
    fn precomputed_checks_shape() {
        let b = BandRaster::new(3, 3, 1.0);
        let bands = SpectralBands::new(b.clone(), b.clone(), b).unwrap();
        assert!(Precomputed(LabelRaster::new(3, 3, 0)).segment(&bands).is_ok());
        assert!(Precomputed(LabelRaster::new(2, 3, 0)).segment(&bands).is_err());
    }

    #[test]
    fn count_segments_distinct() {
        let l = LabelRaster::from_vec(vec![3, 3, 1, 7, 1, 0], 3, 2).unwrap();
        assert_eq!(count_segments(&l), 4);
    }
}
