use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub name: String,
    pub available: bool,
}

/// A region and its zones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionZoneInfo {
    pub name: String,
    pub zones: Vec<ZoneInfo>,
}
