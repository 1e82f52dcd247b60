//! Lot records: the table handed from extraction to selection.
//!
//! Serialized field names are the eight-column table contract shared by both
//! stages; they must not change.

use serde::{Deserialize, Serialize};

/// Land-cover category assigned to a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LandType {
    #[serde(rename = "Nước")]
    Water,
    #[serde(rename = "Rừng")]
    Forest,
    #[serde(rename = "Đất trống")]
    Bare,
    #[serde(rename = "Cây bụi")]
    Shrub,
}

impl LandType {
    pub const ALL: [LandType; 4] = [
        LandType::Water,
        LandType::Forest,
        LandType::Bare,
        LandType::Shrub,
    ];

    /// Label written to the table.
    pub fn label(self) -> &'static str {
        match self {
            LandType::Water => "Nước",
            LandType::Forest => "Rừng",
            LandType::Bare => "Đất trống",
            LandType::Shrub => "Cây bụi",
        }
    }

    pub fn is_water(self) -> bool {
        matches!(self, LandType::Water)
    }
}

/// One segmented region with its derived economics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    #[serde(rename = "ID_Lô")]
    pub id: u32,
    #[serde(rename = "Loại_Đất")]
    pub land_type: LandType,
    /// 0/1 on disk; see `io::table` for categorical input.
    #[serde(rename = "Wi_Là_Nước", with = "water_flag")]
    pub is_water: bool,
    #[serde(rename = "Ei_Điện_Năng")]
    pub energy: f64,
    #[serde(rename = "Ci_Chi_Phí")]
    pub cost: u64,
    #[serde(rename = "Diện_Tích")]
    pub area: u64,
    #[serde(rename = "NDVI")]
    pub ndvi: f64,
    #[serde(rename = "NDWI")]
    pub ndwi: f64,
}

/// Column order of the table contract.
pub const LOT_COLUMNS: [&str; 8] = [
    "ID_Lô",
    "Loại_Đất",
    "Wi_Là_Nước",
    "Ei_Điện_Năng",
    "Ci_Chi_Phí",
    "Diện_Tích",
    "NDVI",
    "NDWI",
];

mod water_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(d)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_water_is_water() {
        for t in LandType::ALL {
            assert_eq!(t.is_water(), t == LandType::Water);
        }
    }

    #[test]
    fn json_uses_table_column_names() {
        let lot = Lot {
            id: 4,
            land_type: LandType::Bare,
            is_water: false,
            energy: 123.45,
            cost: 650,
            area: 13,
            ndvi: 0.051,
            ndwi: -0.2,
        };
        let v = serde_json::to_value(&lot).unwrap();
        let obj = v.as_object().unwrap();
        for col in LOT_COLUMNS {
            assert!(obj.contains_key(col), "missing column {col}");
        }
        assert_eq!(obj["Loại_Đất"], "Đất trống");
        assert_eq!(obj["Wi_Là_Nước"], 0);
    }
}
