use super::KeyValue;
use crate::iid::Iid;
use crate::status::PublicIpStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    Inbound,
    Outbound,
}

/// Firewall rule. Port `-1` on both ends means every port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityRule {
    pub direction: RuleDirection,
    /// `tcp`, `udp`, `icmp` or `all`
    pub protocol: String,
    pub from_port: i32,
    pub to_port: i32,
    pub cidr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupInfo {
    pub iid: Iid,
    pub vpc_id: String,
    pub description: String,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupRequest {
    pub name: String,
    pub vpc_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicIpInfo {
    pub iid: Iid,
    pub public_ip: String,
    pub status: PublicIpStatus,
    pub owner_vm: Option<Iid>,
    pub private_ip: Option<String>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicIpRequest {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

/// A virtual network with its subnets, re-derived from the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpcInfo {
    pub iid: Iid,
    pub ipv4_cidr: String,
    /// Internet gateway attached to the network, if any
    pub internet_gateway: Option<String>,
    #[serde(default)]
    pub subnets: Vec<SubnetInfo>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetInfo {
    pub iid: Iid,
    pub zone: String,
    pub ipv4_cidr: String,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

/// Request for [`crate::handler::VpcHandler::create`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpcRequest {
    pub name: String,
    pub ipv4_cidr: String,
    #[serde(default)]
    pub subnets: Vec<SubnetRequest>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}

/// A subnet to create; the zone defaults to the connection's zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubnetRequest {
    pub name: String,
    #[serde(default)]
    pub zone: Option<String>,
    pub ipv4_cidr: String,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
}
