//! Band file discovery inside a scene directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::raster::{is_jpeg2000, jpeg2000_unsupported};
use crate::error::{LotplanError, Result};

const RASTER_EXTENSIONS: [&str; 2] = ["tif", "tiff"];
/// Products that reuse band codes in their names but are not band data.
const SKIP_MARKERS: [&str; 2] = ["TCI", "PVI"];

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RASTER_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn collect_rasters(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rasters(&path, out)?;
        } else if is_raster(&path) || is_jpeg2000(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Find the raster for band `code` (e.g. `"B04"`) under `root`.
///
/// A file under an `IMG_DATA` directory whose name is free of preview
/// markers wins; otherwise the first match in sorted path order. When the
/// band only exists as JPEG 2000 the error names that file.
pub fn locate_band(root: &Path, code: &str) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(LotplanError::MissingInput(root.to_path_buf()));
    }
    let mut files = Vec::new();
    collect_rasters(root, &mut files)?;
    files.sort();

    let (jpeg2000, candidates): (Vec<&PathBuf>, Vec<&PathBuf>) = files
        .iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.contains(code))
                .unwrap_or(false)
        })
        .partition(|p| is_jpeg2000(p));
    if candidates.is_empty() {
        if let Some(p) = jpeg2000.first() {
            return Err(jpeg2000_unsupported(p));
        }
    }

    let preferred = candidates.iter().find(|p| {
        let s = p.to_string_lossy();
        s.contains("IMG_DATA") && !SKIP_MARKERS.iter().any(|m| s.contains(m))
    });
    let chosen = preferred
        .or_else(|| candidates.first())
        .map(|p| p.to_path_buf())
        .ok_or_else(|| LotplanError::MissingInput(root.join(format!("*{code}*.tif"))))?;
    debug!("band {code}: {}", chosen.display());
    Ok(chosen)
}
