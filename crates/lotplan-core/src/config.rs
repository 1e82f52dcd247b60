//! Run configuration shared by both stages.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "segmentation": { "n_segments": 500 }, "selection": { "budget_fraction": 0.2 } }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LotplanError, Result};
use crate::features::FeatureParams;
use crate::segmentation::SlicParams;
use crate::selection::SelectionParams;

/// Band loading options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterParams {
    /// Integer decimation applied to every band on read.
    pub downsample: usize,
    /// Substring identifying each band's file during discovery.
    pub red_code: String,
    pub green_code: String,
    pub nir_code: String,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            downsample: 10,
            red_code: "B04".into(),
            green_code: "B03".into(),
            nir_code: "B08".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raster: RasterParams,
    pub segmentation: SlicParams,
    pub features: FeatureParams,
    pub selection: SelectionParams,
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LotplanError::MissingInput(path.to_path_buf()));
        }
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.raster.downsample == 0 {
            return Err(LotplanError::InvalidParameter {
                name: "downsample",
                reason: "must be at least 1".into(),
            });
        }
        self.segmentation.validate()?;
        self.features.validate()?;
        self.selection.validate()
    }
}
