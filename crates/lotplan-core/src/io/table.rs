//! Lot table files: CSV or JSON, chosen by extension.
//!
//! Writing always uses the 0/1 water flag. Reading also accepts the
//! categorical form (`CÓ` / `KHÔNG`); the first row decides which form the
//! whole column uses.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::error::{LotplanError, Result};
use crate::lot::{LandType, Lot, LOT_COLUMNS};

/// Categorical marker for a water lot.
pub const WATER_YES: &str = "CÓ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "csv" => Ok(TableFormat::Csv),
            Some(ext) if ext == "json" => Ok(TableFormat::Json),
            _ => Err(LotplanError::Table(format!(
                "{}: expected a .csv or .json file",
                path.display()
            ))),
        }
    }
}

/// How the water column is encoded across the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaterEncoding {
    Numeric,
    Categorical,
}

/// A row as stored, before the water column is interpreted.
#[derive(Debug, Deserialize)]
struct RawRow<W> {
    #[serde(rename = "ID_Lô")]
    id: u32,
    #[serde(rename = "Loại_Đất")]
    land_type: LandType,
    #[serde(rename = "Wi_Là_Nước")]
    water: W,
    #[serde(rename = "Ei_Điện_Năng")]
    energy: f64,
    #[serde(rename = "Ci_Chi_Phí")]
    cost: u64,
    #[serde(rename = "Diện_Tích")]
    area: u64,
    #[serde(rename = "NDVI")]
    ndvi: f64,
    #[serde(rename = "NDWI")]
    ndwi: f64,
}

impl<W> RawRow<W> {
    fn into_lot(self, is_water: bool) -> Lot {
        Lot {
            id: self.id,
            land_type: self.land_type,
            is_water,
            energy: self.energy,
            cost: self.cost,
            area: self.area,
            ndvi: self.ndvi,
            ndwi: self.ndwi,
        }
    }
}

/// Water cell as it appears in a file.
trait WaterCell {
    fn is_numeric(&self) -> bool;
    fn as_number(&self) -> Option<f64>;
    fn as_text(&self) -> Option<&str>;
}

impl WaterCell for String {
    fn is_numeric(&self) -> bool {
        self.trim().parse::<f64>().is_ok()
    }

    fn as_number(&self) -> Option<f64> {
        self.trim().parse().ok()
    }

    fn as_text(&self) -> Option<&str> {
        Some(self.trim())
    }
}

impl WaterCell for serde_json::Value {
    fn is_numeric(&self) -> bool {
        self.is_number() || self.is_boolean()
    }

    fn as_number(&self) -> Option<f64> {
        self.as_f64()
            .or_else(|| self.as_bool().map(|b| if b { 1.0 } else { 0.0 }))
    }

    fn as_text(&self) -> Option<&str> {
        self.as_str().map(str::trim)
    }
}

fn interpret_water<W: WaterCell>(rows: Vec<RawRow<W>>) -> Result<Vec<Lot>> {
    let encoding = match rows.first() {
        Some(first) if first.water.is_numeric() => WaterEncoding::Numeric,
        Some(_) => WaterEncoding::Categorical,
        None => return Ok(Vec::new()),
    };

    rows.into_iter()
        .map(|row| -> Result<Lot> {
            let is_water = match encoding {
                WaterEncoding::Numeric => row.water.as_number().map(|v| v != 0.0).ok_or_else(|| {
                    LotplanError::Table(format!("lot {}: water flag is not numeric", row.id))
                })?,
                WaterEncoding::Categorical => row.water.as_text() == Some(WATER_YES),
            };
            if is_water != row.land_type.is_water() {
                warn!(
                    "lot {}: water flag {} disagrees with land type {}",
                    row.id,
                    u8::from(is_water),
                    row.land_type.label()
                );
            }
            Ok(row.into_lot(is_water))
        })
        .collect()
}

/// Read a lot table. A missing file is `MissingInput`; an empty one is
/// `EmptyInput`.
pub fn read_lots(path: &Path) -> Result<Vec<Lot>> {
    if !path.is_file() {
        return Err(LotplanError::MissingInput(path.to_path_buf()));
    }
    let lots = match TableFormat::from_path(path)? {
        TableFormat::Csv => {
            let mut reader = csv::Reader::from_path(path)?;
            let rows = reader
                .deserialize::<RawRow<String>>()
                .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
            interpret_water(rows)?
        }
        TableFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            let rows: Vec<RawRow<serde_json::Value>> = serde_json::from_reader(reader)?;
            interpret_water(rows)?
        }
    };
    if lots.is_empty() {
        return Err(LotplanError::EmptyInput(format!("{} has no lots", path.display())));
    }
    info!("read {} lots from {}", lots.len(), path.display());
    Ok(lots)
}

/// Write lots with the eight table columns. A CSV file always carries the
/// header row, even with no lots.
pub fn write_lots(lots: &[Lot], path: &Path) -> Result<()> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
            wtr.write_record(LOT_COLUMNS)?;
            for lot in lots {
                wtr.serialize(lot)?;
            }
            wtr.flush()?;
        }
        TableFormat::Json => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, lots)?;
        }
    }
    info!("wrote {} lots to {}", lots.len(), path.display());
    Ok(())
}
