use super::KeyValue;
use crate::iid::Iid;
use crate::status::{DiskStatus, ImageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Block storage volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub iid: Iid,
    pub zone: String,
    pub disk_type: String,
    /// Size in GB
    pub disk_size: u32,
    pub status: DiskStatus,
    /// VM the volume is attached to
    pub owner_vm: Option<Iid>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
    /// Provider-specific attributes (encryption, iops, ...)
    #[serde(default)]
    pub key_values: Vec<KeyValue>,
}

/// Request for [`crate::handler::DiskHandler::create`].
///
/// Empty or `"default"` type and size fall back to catalog defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskRequest {
    pub name: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub disk_type: String,
    #[serde(default)]
    pub disk_size: String,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

/// Machine image captured from a VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub iid: Iid,
    pub source_vm: Option<Iid>,
    pub status: ImageStatus,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub name: String,
    pub source_vm: Iid,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}
