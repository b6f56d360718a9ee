//! Resource kinds

use serde::{Deserialize, Serialize};

/// Kind of resource a handler, waiter or call record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Region,
    Vm,
    Disk,
    Image,
    KeyPair,
    SecurityGroup,
    PublicIp,
    Tag,
    LoadBalancer,
    TargetGroup,
    Listener,
    Cluster,
    NodeGroup,
    Role,
    Vpc,
    Subnet,
    InternetGateway,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 17] = [
        Self::Region,
        Self::Vm,
        Self::Disk,
        Self::Image,
        Self::KeyPair,
        Self::SecurityGroup,
        Self::PublicIp,
        Self::Tag,
        Self::LoadBalancer,
        Self::TargetGroup,
        Self::Listener,
        Self::Cluster,
        Self::NodeGroup,
        Self::Role,
        Self::Vpc,
        Self::Subnet,
        Self::InternetGateway,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Vm => "vm",
            Self::Disk => "disk",
            Self::Image => "image",
            Self::KeyPair => "key-pair",
            Self::SecurityGroup => "security-group",
            Self::PublicIp => "public-ip",
            Self::Tag => "tag",
            Self::LoadBalancer => "load-balancer",
            Self::TargetGroup => "target-group",
            Self::Listener => "listener",
            Self::Cluster => "cluster",
            Self::NodeGroup => "node-group",
            Self::Role => "role",
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet-gateway",
        }
    }

    /// Parse the kebab-case form used in config keys and CLI arguments
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_display() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("bucket"), None);
    }
}
