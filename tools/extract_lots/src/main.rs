/// Lot extraction tool: reads red/green/nir bands, segments the scene into
/// lots, and writes the lot table (land type, cost, energy, indices).
///
/// Bands are found by code (B04/B03/B08) under `--scene-dir`, or given
/// explicitly. A precomputed label raster skips segmentation.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use lotplan_core::config::PipelineConfig;
use lotplan_core::io;
use lotplan_core::pipeline::{self, BandPaths};
use lotplan_core::segmentation::{Precomputed, Segmenter, Slic};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "extract_lots",
    about = "Segment a multispectral scene into lots and score each for solar investment"
)]
struct Args {
    /// Scene directory searched recursively for band rasters
    #[arg(long)]
    scene_dir: Option<PathBuf>,

    /// Red band raster (overrides discovery)
    #[arg(long)]
    red: Option<PathBuf>,

    /// Green band raster (overrides discovery)
    #[arg(long)]
    green: Option<PathBuf>,

    /// Near-infrared band raster (overrides discovery)
    #[arg(long)]
    nir: Option<PathBuf>,

    /// Use this label raster instead of running SLIC
    #[arg(long)]
    labels: Option<PathBuf>,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Integer downsample factor applied on read
    #[arg(long)]
    downsample: Option<usize>,

    /// Approximate number of lots
    #[arg(long)]
    n_segments: Option<usize>,

    /// SLIC spatial weight
    #[arg(long)]
    compactness: Option<f64>,

    /// Output lot table (.csv or .json)
    #[arg(short, long, default_value = "Ket_Qua_Phan_Tich.csv")]
    output: PathBuf,

    /// Also write the label raster as a 32-bit TIFF
    #[arg(long)]
    labels_out: Option<PathBuf>,
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Cannot load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(f) = args.downsample {
        config.raster.downsample = f;
    }
    if let Some(n) = args.n_segments {
        config.segmentation.n_segments = n;
    }
    if let Some(c) = args.compactness {
        config.segmentation.compactness = c;
    }
    config.validate().context("Invalid parameters")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = resolve_config(&args)?;

    let paths = BandPaths {
        scene_dir: args.scene_dir.clone(),
        red: args.red.clone(),
        green: args.green.clone(),
        nir: args.nir.clone(),
    };
    let bands = pipeline::load_bands(&paths, &config.raster).context("Cannot load bands")?;
    eprintln!("[extract_lots] bands {}x{}", bands.width(), bands.height());

    let segmenter: Box<dyn Segmenter> = match &args.labels {
        Some(path) => {
            let labels = io::read_labels(path)
                .with_context(|| format!("Cannot read labels {}", path.display()))?;
            Box::new(Precomputed(labels))
        }
        None => Box::new(Slic::new(config.segmentation.clone())),
    };

    let result = pipeline::extract(&bands, segmenter.as_ref(), &config.features)
        .context("Lot extraction failed")?;

    io::write_lots(&result.lots, &args.output)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;
    if let Some(path) = &args.labels_out {
        io::write_labels(&result.labels, path)
            .with_context(|| format!("Cannot write {}", path.display()))?;
    }

    eprintln!(
        "[extract_lots] {} lots → {} ({} ms)",
        result.lots.len(),
        args.output.display(),
        result.elapsed_ms
    );
    Ok(())
}
