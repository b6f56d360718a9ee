//! Configuration file model
//!
//! ```yaml
//! provider:
//!   name: aws
//!   region: us-east-1
//!   zone: us-east-1b
//! gateway:
//!   command: skyrecon-aws-driver
//!   args: ["--profile", "dev"]
//! wait:
//!   default:
//!     initial_delay_ms: 5000
//!     timeout_ms: 300000
//!   overrides:
//!     cluster:
//!       initial_delay_ms: 30000
//!       timeout_ms: 1800000
//! fanout:
//!   concurrency: 8
//! composite:
//!   rollback_on_failure: true
//! cluster:
//!   cluster_role: my-eks-role
//! disk_types:
//!   default: gp2
//!   types:
//!     - { name: io2, min_gb: 10, max_gb: 16384 }
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use skyrecon_aws::{AwsSettings, ClusterRoles, DiskCatalog, DiskTypeSpec};
use skyrecon_core::{CompositePolicy, WaitPolicy};

pub const DEFAULT_PROVIDER: &str = "aws";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_DRIVER: &str = "skyrecon-aws-driver";

const SUPPORTED_PROVIDERS: [&str; 1] = [DEFAULT_PROVIDER];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconConfig {
    pub provider: ProviderSection,
    pub gateway: GatewaySection,
    pub wait: WaitPolicy,
    pub fanout: FanoutSection,
    pub composite: CompositeSection,
    pub cluster: ClusterSection,
    pub disk_types: DiskTypesSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub name: String,
    pub region: String,
    /// Default zone for zonal resources; the region's `a` zone when unset
    pub zone: Option<String>,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER.to_string(),
            region: DEFAULT_REGION.to_string(),
            zone: None,
        }
    }
}

/// External driver process the command gateway runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySection {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            command: DEFAULT_DRIVER.to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FanoutSection {
    /// In-flight describes per list; 0 uses the built-in limit
    pub concurrency: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeSection {
    /// Delete already-created sub-resources when a composite create fails
    pub rollback_on_failure: bool,
}

impl CompositeSection {
    pub fn policy(&self) -> CompositePolicy {
        if self.rollback_on_failure {
            CompositePolicy::Compensate
        } else {
            CompositePolicy::LeaveInPlace
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterSection {
    pub cluster_role: Option<String>,
    pub node_group_role: Option<String>,
}

impl ClusterSection {
    pub fn roles(&self) -> ClusterRoles {
        let defaults = ClusterRoles::default();
        ClusterRoles {
            cluster_role: self.cluster_role.clone().unwrap_or(defaults.cluster_role),
            node_group_role: self
                .node_group_role
                .clone()
                .unwrap_or(defaults.node_group_role),
        }
    }
}

/// Changes to the built-in volume type catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiskTypesSection {
    pub default: Option<String>,
    /// Replaces the bounds of a built-in type or adds a new one
    pub types: Vec<DiskTypeSpec>,
}

impl DiskTypesSection {
    pub fn catalog(&self) -> DiskCatalog {
        let mut catalog = DiskCatalog::default();
        for spec in &self.types {
            match catalog
                .types
                .iter_mut()
                .find(|t| t.name.eq_ignore_ascii_case(&spec.name))
            {
                Some(existing) => *existing = spec.clone(),
                None => catalog.types.push(spec.clone()),
            }
        }
        if let Some(default) = &self.default {
            catalog.default_type = default.clone();
        }
        catalog
    }
}

impl ReconConfig {
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // an empty file is a config with every default
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_PROVIDERS.contains(&self.provider.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported provider '{}', expected one of {}",
                self.provider.name,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
        if self.provider.region.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.region is empty".into()));
        }
        if self.gateway.command.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.command is empty".into()));
        }

        for spec in &self.disk_types.types {
            if spec.name.trim().is_empty() || spec.min_gb == 0 || spec.min_gb > spec.max_gb {
                return Err(ConfigError::Invalid(format!(
                    "disk type '{}' has invalid bounds {}..{} GB",
                    spec.name, spec.min_gb, spec.max_gb
                )));
            }
        }
        let catalog = self.disk_types.catalog();
        if catalog.spec(&catalog.default_type).is_none() {
            return Err(ConfigError::Invalid(format!(
                "default disk type '{}' is not in the catalog",
                catalog.default_type
            )));
        }

        let roles = self.cluster.roles();
        if roles.cluster_role.trim().is_empty() || roles.node_group_role.trim().is_empty() {
            return Err(ConfigError::Invalid("cluster role names must not be empty".into()));
        }
        Ok(())
    }

    /// Settings for an AWS driver, with `region` overriding the file
    pub fn aws_settings(&self, region: Option<&str>) -> AwsSettings {
        let region = region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.provider.region)
            .to_string();
        // a configured zone only applies to the configured region
        let zone = match &self.provider.zone {
            Some(zone) if zone.starts_with(&region) => zone.clone(),
            _ => String::new(),
        };

        AwsSettings {
            region,
            zone,
            wait: self.wait.clone(),
            concurrency: self.fanout.concurrency,
            composite: self.composite.policy(),
            catalog: self.disk_types.catalog(),
            roles: self.cluster.roles(),
        }
    }
}
