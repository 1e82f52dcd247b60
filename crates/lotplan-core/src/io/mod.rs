//! File adapters: band rasters, label rasters, lot tables.
pub mod discover;
pub mod raster;
pub mod table;

pub use discover::locate_band;
pub use raster::{read_band, read_labels, write_band, write_labels};
pub use table::{read_lots, write_lots, TableFormat};
