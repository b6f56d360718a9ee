use super::KeyValue;
use crate::iid::Iid;
use crate::status::VmStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Virtual machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmInfo {
    pub iid: Iid,
    pub status: VmStatus,
    pub zone: String,
    pub image: String,
    pub vm_spec: String,
    pub key_pair: Option<Iid>,
    #[serde(default)]
    pub security_groups: Vec<Iid>,
    pub subnet_id: Option<String>,
    pub vpc_id: Option<String>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub root_device: Option<String>,
    /// Volumes attached besides the root device
    #[serde(default)]
    pub data_disks: Vec<Iid>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmRequest {
    pub name: String,
    pub image: String,
    pub vm_spec: String,
    #[serde(default)]
    pub key_pair: Option<Iid>,
    #[serde(default)]
    pub security_groups: Vec<Iid>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

/// SSH key pair. The private key is only present in the create response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPairInfo {
    pub iid: Iid,
    pub fingerprint: String,
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPairRequest {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}
