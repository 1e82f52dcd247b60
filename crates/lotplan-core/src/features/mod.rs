//! Lot feature extraction: label raster + red/green/nir bands → lot table.
//!
//! Steps:
//! 1. Per-pixel NDVI and NDWI.
//! 2. One pass over the label raster accumulating pixel count, red sum and
//!    index sums per region.
//! 3. Drop degenerate regions (no pixels, zero mean red, non-finite means).
//! 4. Classify and score every surviving region.
pub mod classify;
pub mod indices;
pub mod params;

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::{LotplanError, Result};
use crate::lot::{LandType, Lot};
use crate::raster::{BandRaster, LabelRaster};
pub use classify::{classify, efficiency, score_lot};
pub use params::FeatureParams;

/// The three reflectance bands the extractor needs, on a common grid.
#[derive(Debug, Clone)]
pub struct SpectralBands {
    pub red: BandRaster,
    pub green: BandRaster,
    pub nir: BandRaster,
}

impl SpectralBands {
    /// Bundle the bands, checking they are non-empty and share a grid.
    pub fn new(red: BandRaster, green: BandRaster, nir: BandRaster) -> Result<Self> {
        if red.is_empty() {
            return Err(LotplanError::EmptyInput("red band has no pixels".into()));
        }
        red.check_shape(&green, "green band")?;
        red.check_shape(&nir, "nir band")?;
        Ok(Self { red, green, nir })
    }

    pub fn width(&self) -> usize {
        self.red.width
    }

    pub fn height(&self) -> usize {
        self.red.height
    }
}

/// Running sums for one region.
#[derive(Debug, Default, Clone, Copy)]
struct LotAccumulator {
    count: u64,
    red_sum: f64,
    ndvi_sum: f64,
    ndwi_sum: f64,
}

/// Aggregate per-region statistics and score every valid region.
///
/// Output is sorted by ascending region id; ids of dropped regions leave
/// gaps. Fails with `EmptyResult` if no region survives.
pub fn extract_lots(
    labels: &LabelRaster,
    bands: &SpectralBands,
    params: &FeatureParams,
) -> Result<Vec<Lot>> {
    bands.red.check_shape(labels, "label raster")?;

    let ndvi = indices::ndvi(&bands.nir, &bands.red, params.epsilon)?;
    let ndwi = indices::ndwi(&bands.green, &bands.nir, params.epsilon)?;

    let mut acc: BTreeMap<u32, LotAccumulator> = BTreeMap::new();
    for (i, &label) in labels.data.iter().enumerate() {
        let a = acc.entry(label).or_default();
        a.count += 1;
        a.red_sum += bands.red.data[i];
        a.ndvi_sum += ndvi.data[i];
        a.ndwi_sum += ndwi.data[i];
    }

    let mut lots = Vec::with_capacity(acc.len());
    let mut dropped = 0usize;
    for (&id, a) in &acc {
        if a.count == 0 {
            dropped += 1;
            continue;
        }
        let n = a.count as f64;
        // Zero mean red marks a masked / no-data region.
        if a.red_sum / n == 0.0 {
            debug!("lot {id}: zero mean red, dropped");
            dropped += 1;
            continue;
        }
        let avg_ndvi = a.ndvi_sum / n;
        let avg_ndwi = a.ndwi_sum / n;
        if !avg_ndvi.is_finite() || !avg_ndwi.is_finite() {
            debug!("lot {id}: non-finite mean index, dropped");
            dropped += 1;
            continue;
        }
        lots.push(score_lot(id, a.count, avg_ndvi, avg_ndwi, params));
    }

    info!(
        "extracted {} lots from {} regions ({} dropped)",
        lots.len(),
        acc.len(),
        dropped
    );

    if lots.is_empty() {
        return Err(LotplanError::EmptyResult(format!(
            "none of {} regions produced a valid lot",
            acc.len()
        )));
    }
    Ok(lots)
}

/// Number of lots per land type, in `LandType::ALL` order.
pub fn land_type_counts(lots: &[Lot]) -> Vec<(LandType, usize)> {
    LandType::ALL
        .iter()
        .map(|&t| (t, lots.iter().filter(|l| l.land_type == t).count()))
        .collect()
}
