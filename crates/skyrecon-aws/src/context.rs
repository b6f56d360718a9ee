//! Shared state of one provider connection

use crate::catalog::DiskCatalog;
use crate::codes::AwsErrorClassifier;
use serde::{Deserialize, Serialize};
use skyrecon_core::fanout::DEFAULT_CONCURRENCY;
use skyrecon_core::{
    CallLogger, CompositePolicy, Invoker, ProviderGateway, ResourceKind, WaitPolicy, Waiter,
};
use std::sync::Arc;

/// IAM roles the cluster orchestrator looks up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRoles {
    pub cluster_role: String,
    pub node_group_role: String,
}

impl Default for ClusterRoles {
    fn default() -> Self {
        Self {
            cluster_role: "skyrecon-eks-cluster-role".to_string(),
            node_group_role: "skyrecon-eks-nodegroup-role".to_string(),
        }
    }
}

/// Settings for an [`AwsContext`]
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub region: String,
    /// Default zone for zonal resources; the region's `a` zone when empty
    pub zone: String,
    pub wait: WaitPolicy,
    pub concurrency: usize,
    pub composite: CompositePolicy,
    pub catalog: DiskCatalog,
    pub roles: ClusterRoles,
}

/// Everything a handler needs: the invoker plus connection settings
pub struct AwsContext {
    pub(crate) invoker: Invoker,
    pub(crate) settings: AwsSettings,
}

impl AwsContext {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        logger: Arc<dyn CallLogger>,
        settings: AwsSettings,
    ) -> Self {
        let invoker = Invoker::new(
            gateway,
            Arc::new(AwsErrorClassifier),
            logger,
            settings.region.clone(),
        );
        Self { invoker, settings }
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn region(&self) -> &str {
        &self.settings.region
    }

    pub fn zone(&self) -> String {
        if self.settings.zone.is_empty() {
            format!("{}a", self.settings.region)
        } else {
            self.settings.zone.clone()
        }
    }

    pub fn waiter(&self, kind: ResourceKind) -> Waiter {
        Waiter::new(self.settings.wait.for_kind(kind))
    }

    pub fn concurrency(&self) -> usize {
        if self.settings.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.settings.concurrency
        }
    }

    pub fn composite_policy(&self) -> CompositePolicy {
        self.settings.composite
    }

    pub fn catalog(&self) -> &DiskCatalog {
        &self.settings.catalog
    }

    pub fn roles(&self) -> &ClusterRoles {
        &self.settings.roles
    }
}
