use super::KeyValue;
use crate::iid::Iid;
use crate::status::LoadBalancerStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Network load balancer composite: target group, listener and frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerInfo {
    /// Provider id is the target group's id
    pub iid: Iid,
    pub vpc_id: String,
    pub status: LoadBalancerStatus,
    pub target_group: TargetGroupInfo,
    pub listener: Option<ListenerInfo>,
    pub frontend: Option<FrontendInfo>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGroupInfo {
    pub provider_id: String,
    pub protocol: String,
    pub port: u16,
    #[serde(default)]
    pub members: Vec<Iid>,
    pub health_checker: HealthCheckerInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckerInfo {
    pub protocol: String,
    /// `traffic-port` or a port number
    pub port: String,
    pub interval_secs: u32,
    pub timeout_secs: u32,
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerInfo {
    pub provider_id: String,
    pub protocol: String,
    pub port: u16,
}

/// The balancer itself, as reached by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendInfo {
    pub provider_id: String,
    pub dns_name: String,
    pub scheme: String,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberState {
    Healthy,
    Unhealthy,
    Pending,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberHealth {
    pub vm: Iid,
    pub state: MemberState,
}

/// Request for [`crate::handler::LoadBalancerHandler::create`].
///
/// Ports are kept as strings and parsed by the step that uses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerRequest {
    pub name: String,
    pub vpc_id: String,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    /// `internet-facing` (default) or `internal`
    #[serde(default)]
    pub scheme: Option<String>,
    pub listener: ListenerRequest,
    pub target_group: TargetGroupRequest,
    #[serde(default)]
    pub health_checker: Option<HealthCheckerRequest>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerRequest {
    pub protocol: String,
    pub port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroupRequest {
    pub protocol: String,
    pub port: String,
    #[serde(default)]
    pub members: Vec<Iid>,
}

/// Health check settings. `None` fields take provider defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckerRequest {
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub interval_secs: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u32>,
    #[serde(default)]
    pub threshold: Option<u32>,
}
