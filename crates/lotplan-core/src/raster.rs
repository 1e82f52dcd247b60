use serde::{Deserialize, Serialize};

use crate::error::{LotplanError, Result};

/// A 2D grid stored row-major. Bands and index planes use `f64`,
/// segmentation labels use `u32`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster<T> {
    /// Row-major cell values.
    pub data: Vec<T>,
    pub width: usize,
    pub height: usize,
}

/// Band or index plane.
pub type BandRaster = Raster<f64>;

/// Region id per pixel, as produced by segmentation.
pub type LabelRaster = Raster<u32>;

impl<T: Copy> Raster<T> {
    /// Create a new raster filled with the given value.
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer. Fails if the buffer length does not
    /// match `width * height`.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(LotplanError::Raster(format!(
                "buffer of {} cells cannot form a {width}x{height} grid",
                data.len()
            )));
        }
        Ok(Self { data, width, height })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: T) {
        self.data[row * self.width + col] = val;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape<U>(&self, other: &Raster<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Error unless `other` shares this raster's grid. `what` names `other`
    /// in the diagnostic.
    pub fn check_shape<U>(&self, other: &Raster<U>, what: &'static str) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(LotplanError::ShapeMismatch {
                what,
                expected_w: self.width,
                expected_h: self.height,
                actual_w: other.width,
                actual_h: other.height,
            })
        }
    }

    /// Nearest-neighbour decimation by an integer factor. Output is
    /// `height / factor` × `width / factor`; each output cell samples the
    /// source cell under its centre. A factor of 0 or 1 returns a copy.
    pub fn downsample(&self, factor: usize) -> Self {
        if factor <= 1 {
            return self.clone();
        }
        let out_w = self.width / factor;
        let out_h = self.height / factor;
        let mut data = Vec::with_capacity(out_w * out_h);
        for r in 0..out_h {
            let src_r = (((r as f64 + 0.5) * self.height as f64 / out_h as f64) as usize)
                .min(self.height - 1);
            for c in 0..out_w {
                let src_c = (((c as f64 + 0.5) * self.width as f64 / out_w as f64) as usize)
                    .min(self.width - 1);
                data.push(self.get(src_r, src_c));
            }
        }
        Self {
            data,
            width: out_w,
            height: out_h,
        }
    }
}

impl Raster<f64> {
    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Raster::from_vec(vec![0.0f32; 5], 2, 3).is_err());
        assert!(Raster::from_vec(vec![0.0f32; 6], 2, 3).is_ok());
    }

    #[test]
    fn get_set_is_row_major() {
        let mut r = Raster::new(3, 2, 0u32);
        r.set(1, 2, 7);
        assert_eq!(r.data[5], 7);
        assert_eq!(r.get(1, 2), 7);
    }

    #[test]
    fn downsample_picks_centre_samples() {
        // 4×4 grid where value = row * 4 + col; factor 2 → 2×2 sampling cells (1,1),(1,3),(3,1),(3,3).
        let data: Vec<f64> = (0..16).map(|v| v as f64).collect();
        let r = Raster::from_vec(data, 4, 4).unwrap();
        let d = r.downsample(2);
        assert_eq!((d.width, d.height), (2, 2));
        assert_eq!(d.data, vec![5.0, 7.0, 13.0, 15.0]);
    }

    #[test]
    fn check_shape_reports_mismatch() {
        let a = Raster::new(4, 4, 0.0f32);
        let b = Raster::new(4, 3, 0u32);
        match a.check_shape(&b, "labels") {
            Err(LotplanError::ShapeMismatch { what, actual_h, .. }) => {
                assert_eq!(what, "labels");
                assert_eq!(actual_h, 3);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn min_max_over_values() {
        let r = Raster::from_vec(vec![3.0f64, -1.0, 8.5, 0.0], 2, 2).unwrap();
        assert_eq!(r.min_value(), -1.0);
        assert_eq!(r.max_value(), 8.5);
    }
}
