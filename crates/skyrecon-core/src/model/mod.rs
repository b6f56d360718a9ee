//! Canonical resource records and create requests
//!
//! These types hold provider-neutral data only. Provider adapters convert
//! their wire shapes into them; nothing here knows about any provider.

mod cluster;
mod compute;
mod load_balancer;
mod network;
mod region;
mod storage;

pub use cluster::*;
pub use compute::*;
pub use load_balancer::*;
pub use network::*;
pub use region::*;
pub use storage::*;

use crate::kind::ResourceKind;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

/// Tag or provider-specific attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tags attached to one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    pub kind: ResourceKind,
    pub iid: Iid,
    pub tags: Vec<KeyValue>,
}
