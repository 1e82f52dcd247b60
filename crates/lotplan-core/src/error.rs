//! Error type shared by the extraction and selection stages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced anywhere in the lot pipeline. Every variant is terminal
/// for the run: callers report it and stop.
#[derive(Error, Debug)]
pub enum LotplanError {
    /// A required input file does not exist.
    #[error("missing input: {}", .0.display())]
    MissingInput(PathBuf),

    /// An input was present but carried no data (no bands, empty raster, empty table).
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Two rasters that must share a grid do not.
    #[error("raster shape mismatch: {what} is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    ShapeMismatch {
        what: &'static str,
        expected_w: usize,
        expected_h: usize,
        actual_w: usize,
        actual_h: usize,
    },

    /// Computation finished but produced nothing usable downstream.
    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error("invalid parameter: {name} ({reason})")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("raster error: {0}")]
    Raster(String),

    /// The file exists but is in a format this build cannot decode.
    #[error("unsupported format: {} ({reason})", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("table error: {0}")]
    Table(String),

    /// The optimiser errored or returned an assignment that cannot be trusted.
    /// Never used for a valid empty selection.
    #[error("solver failure: {0}")]
    SolverFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tiff::TiffError> for LotplanError {
    fn from(e: tiff::TiffError) -> Self {
        LotplanError::Raster(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LotplanError>;
