//! Stage orchestration: bands → lots, and lots → investment plan.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use crate::config::RasterParams;
use crate::error::{LotplanError, Result};
use crate::features::{extract_lots, land_type_counts, FeatureParams, SpectralBands};
use crate::io;
use crate::lot::Lot;
use crate::raster::LabelRaster;
use crate::segmentation::{count_segments, Segmenter};
use crate::selection::{select_lots, SelectionParams, SelectionPlan, Solver};

// ── Band sources ─────────────────────────────────────────────────────────────

/// Where the three bands come from. Explicit paths win over discovery.
#[derive(Debug, Clone, Default)]
pub struct BandPaths {
    pub scene_dir: Option<PathBuf>,
    pub red: Option<PathBuf>,
    pub green: Option<PathBuf>,
    pub nir: Option<PathBuf>,
}

impl BandPaths {
    fn resolve(&self, explicit: &Option<PathBuf>, code: &str) -> Result<PathBuf> {
        if let Some(p) = explicit {
            return Ok(p.clone());
        }
        match &self.scene_dir {
            Some(dir) => io::locate_band(dir, code),
            None => Err(LotplanError::EmptyInput(format!(
                "no path or scene directory given for band {code}"
            ))),
        }
    }
}

/// Resolve and read red, green and nir onto a common grid.
pub fn load_bands(paths: &BandPaths, params: &RasterParams) -> Result<SpectralBands> {
    let red_path = paths.resolve(&paths.red, &params.red_code)?;
    let green_path = paths.resolve(&paths.green, &params.green_code)?;
    let nir_path = paths.resolve(&paths.nir, &params.nir_code)?;
    // Check all three exist before decoding any of them.
    for p in [&red_path, &green_path, &nir_path] {
        if !p.is_file() {
            return Err(LotplanError::MissingInput(p.clone()));
        }
    }
    let red = io::read_band(&red_path, params.downsample)?;
    let green = io::read_band(&green_path, params.downsample)?;
    let nir = io::read_band(&nir_path, params.downsample)?;
    info!("bands loaded at {}x{} (downsample {})", red.width, red.height, params.downsample);
    debug!(
        "reflectance ranges: red {:.1}..{:.1}, green {:.1}..{:.1}, nir {:.1}..{:.1}",
        red.min_value(),
        red.max_value(),
        green.min_value(),
        green.max_value(),
        nir.min_value(),
        nir.max_value()
    );
    SpectralBands::new(red, green, nir)
}

// ── Extraction ───────────────────────────────────────────────────────────────

pub struct ExtractionResult {
    pub labels: LabelRaster,
    pub lots: Vec<Lot>,
    pub elapsed_ms: u64,
}

/// Segment the scene and derive one `Lot` per valid region.
///
/// Order:
///   1. Segmentation
///   2. Per-lot aggregation, classification and scoring
pub fn extract(
    bands: &SpectralBands,
    segmenter: &dyn Segmenter,
    params: &FeatureParams,
) -> Result<ExtractionResult> {
    let t0 = Instant::now();
    params.validate()?;

    // ── 1. Segmentation ─────────────────────────────────────────────────────
    let labels = segmenter.segment(bands)?;
    info!("segmentation produced {} regions", count_segments(&labels));

    // ── 2. Aggregation and scoring ──────────────────────────────────────────
    let lots = extract_lots(&labels, bands, params)?;
    for (land_type, n) in land_type_counts(&lots) {
        info!("  {:<10} {n}", land_type.label());
    }

    Ok(ExtractionResult {
        labels,
        lots,
        elapsed_ms: t0.elapsed().as_millis() as u64,
    })
}

// ── Selection ────────────────────────────────────────────────────────────────

/// Solve the investment plan for a lot table and log its totals.
pub fn select(lots: &[Lot], solver: &dyn Solver, params: &SelectionParams) -> Result<SelectionPlan> {
    let plan = select_lots(lots, solver, params)?;
    info!(
        "plan: {} lots, cost {} of budget {:.2}, energy {:.2} ({:?})",
        plan.count, plan.total_cost, plan.budget, plan.total_energy, plan.status
    );
    Ok(plan)
}

/// Read a table, solve, and write the selected rows to `output`.
pub fn select_from_file(
    input: &Path,
    output: &Path,
    solver: &dyn Solver,
    params: &SelectionParams,
) -> Result<SelectionPlan> {
    let lots = io::read_lots(input)?;
    let plan = select(&lots, solver, params)?;
    io::write_lots(&plan.lots, output)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::{LandType, LOT_COLUMNS};
    use crate::raster::BandRaster;
    use crate::segmentation::{Precomputed, Slic, SlicParams};
    use crate::selection::test_support::lot;
    use crate::selection::{DynamicProgramming, SolveStatus};

    /// 20×20 scene in reflectance units: forest on the left, open water on
    /// the right, a bare strip along the bottom.
    fn scene() -> SpectralBands {
        let (w, h) = (20, 20);
        let mut red = BandRaster::new(w, h, 0.0);
        let mut green = BandRaster::new(w, h, 0.0);
        let mut nir = BandRaster::new(w, h, 0.0);
        for r in 0..h {
            for c in 0..w {
                let (rv, gv, nv) = if r >= 16 {
                    (1500.0, 1200.0, 1700.0)
                } else if c < 10 {
                    (300.0, 500.0, 2700.0)
                } else {
                    (200.0, 900.0, 100.0)
                };
                red.set(r, c, rv);
                green.set(r, c, gv);
                nir.set(r, c, nv);
            }
        }
        SpectralBands::new(red, green, nir).unwrap()
    }

    #[test]
    fn precomputed_labels_end_to_end() {
        let bands = scene();
        let mut labels = LabelRaster::new(20, 20, 0);
        for r in 0..20 {
            for c in 0..20 {
                let l = if r >= 16 { 2 } else if c < 10 { 0 } else { 1 };
                labels.set(r, c, l);
            }
        }
        let res = extract(&bands, &Precomputed(labels), &FeatureParams::default()).unwrap();
        let types: Vec<LandType> = res.lots.iter().map(|l| l.land_type).collect();
        assert_eq!(types, vec![LandType::Forest, LandType::Water, LandType::Bare]);

        let params = SelectionParams { budget_fraction: 0.5, ..SelectionParams::default() };
        let plan = select(&res.lots, &DynamicProgramming::default(), &params).unwrap();
        assert!(plan.lots.iter().all(|l| !l.is_water));
        assert_eq!(plan.status, SolveStatus::Optimal);
        // Budget 0.5 × (160·200 + 160·100 + 80·50) = 26000 fits only the bare strip.
        assert_eq!(plan.ids(), vec![2]);
    }

    #[test]
    fn slic_end_to_end_respects_invariants() {
        let bands = scene();
        let slic = Slic::new(SlicParams { n_segments: 8, compactness: 0.5, ..SlicParams::default() });
        let res = extract(&bands, &slic, &FeatureParams::default()).unwrap();
        assert!(!res.lots.is_empty());
        let total_area: u64 = res.lots.iter().map(|l| l.area).sum();
        assert_eq!(total_area, 400);
        for lot in &res.lots {
            assert_eq!(lot.is_water, lot.land_type == LandType::Water);
        }

        let plan = select(&res.lots, &DynamicProgramming::default(), &SelectionParams::default()).unwrap();
        let total: u64 = res.lots.iter().map(|l| l.cost).sum();
        assert!(plan.total_cost as f64 <= 0.15 * total as f64 + 1e-9);
        assert!(plan.lots.iter().all(|l| !l.is_water));
    }

    #[test]
    fn files_in_files_out() {
        let dir = tempfile::tempdir().unwrap();
        let bands = scene();
        let img = dir.path().join("GRANULE").join("IMG_DATA");
        std::fs::create_dir_all(&img).unwrap();
        for (name, band) in [("T_B04.tif", &bands.red), ("T_B03.tif", &bands.green), ("T_B08.tif", &bands.nir)] {
            io::write_band(band, &img.join(name)).unwrap();
        }

        let paths = BandPaths { scene_dir: Some(dir.path().to_path_buf()), ..BandPaths::default() };
        let raster = RasterParams { downsample: 1, ..RasterParams::default() };
        let loaded = load_bands(&paths, &raster).unwrap();
        assert_eq!(loaded.red, bands.red);

        let slic = Slic::new(SlicParams { n_segments: 4, ..SlicParams::default() });
        let res = extract(&loaded, &slic, &FeatureParams::default()).unwrap();
        let table = dir.path().join("lots.csv");
        io::write_lots(&res.lots, &table).unwrap();

        let out = dir.path().join("plan.csv");
        let plan = select_from_file(&table, &out, &DynamicProgramming::default(), &SelectionParams::default()).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(LOT_COLUMNS.join(",").as_str()));
        assert_eq!(lines.count(), plan.count);
    }

    #[test]
    fn empty_plan_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let lots = vec![lot(0, 1000, 50.0, false), lot(1, 2000, 80.0, false), lot(2, 500, 10.0, true)];
        let table = dir.path().join("lots.csv");
        io::write_lots(&lots, &table).unwrap();

        // Budget 525 affords no dry lot.
        let out = dir.path().join("plan.csv");
        let plan = select_from_file(&table, &out, &DynamicProgramming::default(), &SelectionParams::default()).unwrap();
        assert_eq!(plan.count, 0);
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.trim_end(), LOT_COLUMNS.join(","));
    }

    #[test]
    fn missing_band_detected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let paths = BandPaths {
            red: Some(dir.path().join("red.tif")),
            green: Some(dir.path().join("green.tif")),
            nir: Some(dir.path().join("nir.tif")),
            ..BandPaths::default()
        };
        assert!(matches!(
            load_bands(&paths, &RasterParams::default()),
            Err(LotplanError::MissingInput(_))
        ));
    }
}
