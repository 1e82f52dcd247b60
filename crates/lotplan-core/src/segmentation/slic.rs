//! SLIC superpixels (simple linear iterative clustering).
//!
//! Pixels are clustered in a joint colour/position space. The colour vector
//! is `[nir, red, green] / reflectance_scale`, clipped to [0, 1]. With grid
//! step `S = sqrt(N / n_segments)` each centre only competes for pixels
//! within `S` rows/cols of itself, using
//!
//!   d = |c_p − c_k|² + (|xy_p − xy_k| / S)² · compactness²
//!
//! Higher compactness gives more regular, grid-like lots.

use log::debug;
use serde::{Deserialize, Serialize};

use super::connectivity::enforce_connectivity;
use super::Segmenter;
use crate::error::{LotplanError, Result};
use crate::features::SpectralBands;
use crate::raster::LabelRaster;

const N_CHANNELS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicParams {
    /// Approximate number of lots to produce.
    pub n_segments: usize,
    /// Weight of spatial proximity against colour similarity.
    pub compactness: f64,
    pub max_iterations: usize,
    /// Divides raw reflectance before clipping to [0, 1].
    pub reflectance_scale: f64,
    pub enforce_connectivity: bool,
    /// Components smaller than this fraction of the mean segment size are merged.
    pub min_size_factor: f64,
}

impl Default for SlicParams {
    fn default() -> Self {
        Self {
            n_segments: 300,
            compactness: 20.0,
            max_iterations: 10,
            reflectance_scale: 3000.0,
            enforce_connectivity: true,
            min_size_factor: 0.5,
        }
    }
}

impl SlicParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_segments == 0 {
            return Err(LotplanError::InvalidParameter {
                name: "n_segments",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.compactness.is_finite() && self.compactness > 0.0) {
            return Err(LotplanError::InvalidParameter {
                name: "compactness",
                reason: format!("must be positive, got {}", self.compactness),
            });
        }
        if !(self.reflectance_scale.is_finite() && self.reflectance_scale > 0.0) {
            return Err(LotplanError::InvalidParameter {
                name: "reflectance_scale",
                reason: format!("must be positive, got {}", self.reflectance_scale),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Centre {
    row: f64,
    col: f64,
    colour: [f64; N_CHANNELS],
}

#[derive(Debug, Clone, Default)]
pub struct Slic {
    pub params: SlicParams,
}

impl Slic {
    pub fn new(params: SlicParams) -> Self {
        Self { params }
    }
}

/// Interleaved `[nir, red, green]` colour vectors, scaled and clipped.
fn feature_image(bands: &SpectralBands, scale: f64) -> Vec<[f64; N_CHANNELS]> {
    (0..bands.red.len())
        .map(|i| {
            [
                (bands.nir.data[i] / scale).clamp(0.0, 1.0),
                (bands.red.data[i] / scale).clamp(0.0, 1.0),
                (bands.green.data[i] / scale).clamp(0.0, 1.0),
            ]
        })
        .collect()
}

fn colour_dist2(a: &[f64; N_CHANNELS], b: &[f64; N_CHANNELS]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Centres on a regular grid of roughly `n_segments` cells.
fn seed_centres(
    pixels: &[[f64; N_CHANNELS]],
    width: usize,
    height: usize,
    step: f64,
) -> Vec<Centre> {
    let ny = ((height as f64 / step).round() as usize).max(1);
    let nx = ((width as f64 / step).round() as usize).max(1);
    let mut centres = Vec::with_capacity(nx * ny);
    for gy in 0..ny {
        let row = (gy as f64 + 0.5) * height as f64 / ny as f64;
        for gx in 0..nx {
            let col = (gx as f64 + 0.5) * width as f64 / nx as f64;
            let (r, c) = ((row as usize).min(height - 1), (col as usize).min(width - 1));
            centres.push(Centre {
                row,
                col,
                colour: pixels[r * width + c],
            });
        }
    }
    centres
}

impl Segmenter for Slic {
    fn segment(&self, bands: &SpectralBands) -> Result<LabelRaster> {
        self.params.validate()?;
        let (width, height) = (bands.width(), bands.height());
        let n_pixels = width * height;
        if n_pixels == 0 {
            return Err(LotplanError::EmptyInput("cannot segment an empty raster".into()));
        }

        let pixels = feature_image(bands, self.params.reflectance_scale);
        let step = (n_pixels as f64 / self.params.n_segments as f64).sqrt().max(1.0);
        let spatial_weight = (self.params.compactness / step).powi(2);
        let radius = step.ceil() as isize;

        let mut centres = seed_centres(&pixels, width, height, step);
        let mut labels = vec![u32::MAX; n_pixels];
        let mut dist = vec![f64::INFINITY; n_pixels];

        for iter in 0..self.params.max_iterations.max(1) {
            dist.fill(f64::INFINITY);

            for (k, centre) in centres.iter().enumerate() {
                let cr = centre.row as isize;
                let cc = centre.col as isize;
                let r0 = (cr - radius).max(0) as usize;
                let r1 = ((cr + radius) as usize).min(height - 1);
                let c0 = (cc - radius).max(0) as usize;
                let c1 = ((cc + radius) as usize).min(width - 1);
                for r in r0..=r1 {
                    for c in c0..=c1 {
                        let idx = r * width + c;
                        let dy = r as f64 - centre.row;
                        let dx = c as f64 - centre.col;
                        let d = colour_dist2(&pixels[idx], &centre.colour)
                            + (dy * dy + dx * dx) * spatial_weight;
                        if d < dist[idx] {
                            dist[idx] = d;
                            labels[idx] = k as u32;
                        }
                    }
                }
            }

            // Recompute centres as the mean of their members.
            let mut sums = vec![(0.0f64, 0.0f64, [0.0f64; N_CHANNELS], 0usize); centres.len()];
            for (idx, &k) in labels.iter().enumerate() {
                if k == u32::MAX {
                    continue;
                }
                let s = &mut sums[k as usize];
                s.0 += (idx / width) as f64;
                s.1 += (idx % width) as f64;
                for ch in 0..N_CHANNELS {
                    s.2[ch] += pixels[idx][ch];
                }
                s.3 += 1;
            }
            let mut shift = 0.0f64;
            for (centre, (rs, cs, colour, n)) in centres.iter_mut().zip(sums) {
                if n == 0 {
                    continue;
                }
                let n = n as f64;
                let (row, col) = (rs / n, cs / n);
                shift = shift.max((row - centre.row).abs() + (col - centre.col).abs());
                centre.row = row;
                centre.col = col;
                centre.colour = colour.map(|v| v / n);
            }
            debug!("slic iteration {iter}: max centre shift {shift:.3} px");
            if shift < 1e-3 {
                break;
            }
        }

        // Any pixel outside every search window goes to the spatially nearest centre.
        for (idx, label) in labels.iter_mut().enumerate() {
            if *label != u32::MAX {
                continue;
            }
            let (r, c) = ((idx / width) as f64, (idx % width) as f64);
            let nearest = centres
                .iter()
                .enumerate()
                .map(|(k, ct)| (k, (ct.row - r).powi(2) + (ct.col - c).powi(2)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(k, _)| k)
                .unwrap_or(0);
            *label = nearest as u32;
        }

        let raw = LabelRaster::from_vec(labels, width, height)?;
        if !self.params.enforce_connectivity {
            return Ok(raw);
        }
        let min_size =
            (self.params.min_size_factor * n_pixels as f64 / self.params.n_segments as f64) as usize;
        Ok(enforce_connectivity(&raw, min_size))
    }
}
