//! Lot planning from multispectral imagery.
//!
//! Two stages share this crate:
//!   * extraction: red/green/nir bands → segmented lots with land type,
//!     cost and energy potential (`features`, `segmentation`, `pipeline::extract`);
//!   * selection: lot table → the energy-maximising set of non-water lots
//!     within a budget (`selection`, `pipeline::select`).
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod lot;
pub mod pipeline;
pub mod raster;
pub mod segmentation;
pub mod selection;

pub use config::PipelineConfig;
pub use error::{LotplanError, Result};
pub use lot::{LandType, Lot};
