use super::KeyValue;
use crate::iid::Iid;
use crate::status::{ClusterStatus, NodeGroupStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Managed Kubernetes cluster with its node groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub iid: Iid,
    pub version: String,
    pub status: ClusterStatus,
    pub network: ClusterNetwork,
    pub endpoint: Option<String>,
    #[serde(default)]
    pub node_groups: Vec<NodeGroupInfo>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNetwork {
    pub vpc_id: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGroupInfo {
    pub iid: Iid,
    pub status: NodeGroupStatus,
    pub image: String,
    pub vm_spec: String,
    pub root_disk_size: u32,
    pub key_pair: Option<Iid>,
    pub desired_size: u32,
    pub min_size: u32,
    pub max_size: u32,
    /// VMs currently backing the group
    #[serde(default)]
    pub nodes: Vec<Iid>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub name: String,
    /// Kubernetes version; patch level is dropped
    #[serde(default)]
    pub version: String,
    pub network: ClusterNetwork,
    #[serde(default)]
    pub node_groups: Vec<NodeGroupRequest>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupRequest {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub vm_spec: String,
    #[serde(default)]
    pub root_disk_size: Option<u32>,
    #[serde(default)]
    pub key_pair: Option<Iid>,
    pub desired_size: u32,
    pub min_size: u32,
    pub max_size: u32,
}

/// Scaling bounds for an existing node group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupScaling {
    pub desired_size: u32,
    pub min_size: u32,
    pub max_size: u32,
}
