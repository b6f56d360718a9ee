//! In-memory provider for skyrecon
//!
//! [`SimCloud`] answers the same operations as a real AWS-shaped provider
//! gateway, keeping all state in memory. Resources move through their
//! transitional states as they are described, so handlers see creation,
//! deletion and scaling take a few polls, the way they do against a real
//! cloud.
//!
//! # Example
//!
//! ```ignore
//! use skyrecon_sim::{Fault, SimCloud};
//!
//! let sim = SimCloud::new();
//! sim.inject(Fault::on("ec2:DescribeVolumes").code("Throttling").times(2));
//! ```

mod ec2;
mod eks;
mod elb;
pub mod error;
pub mod fault;
mod tagging;
mod vpc;
mod world;

pub use eks::DEFAULT_ROLES;
pub use error::{SimError, SimResult};
pub use fault::Fault;
pub use world::SimConfig;

use async_trait::async_trait;
use skyrecon_core::{ProviderError, ProviderGateway};
use std::sync::{Mutex, MutexGuard};
use world::World;

/// Simulated AWS-shaped cloud
pub struct SimCloud {
    world: Mutex<World>,
}

impl Default for SimCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl SimCloud {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            world: Mutex::new(World::new(config)),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        // a panicking test thread must not hide the state from the others
        self.world.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn region(&self) -> String {
        self.world().config.region.clone()
    }

    /// Fail matching calls until the fault runs out
    pub fn inject(&self, fault: Fault) {
        self.world().faults.push(fault);
    }

    pub fn clear_faults(&self) {
        self.world().faults.clear();
    }

    /// Let the next `count` creations of `resource_type` (e.g. `volume`)
    /// succeed but settle in the provider's failed state
    pub fn fail_creations(&self, resource_type: &str, count: u32) {
        *self
            .world()
            .doomed
            .entry(resource_type.to_string())
            .or_default() += count;
    }

    /// Calls made to `operation`, failed ones included
    pub fn calls(&self, operation: &str) -> usize {
        self.world().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.world().calls.values().sum()
    }

    pub fn reset_calls(&self) {
        self.world().calls.clear();
    }

    pub fn add_role(&self, name: &str) {
        let mut world = self.world();
        let account = world.config.account.clone();
        world.eks.add_role(&account, name);
    }

    pub fn remove_role(&self, name: &str) -> bool {
        self.world().eks.remove_role(name)
    }

    /// Run one operation synchronously
    pub fn call(
        &self,
        operation: &str,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let result = self.world().dispatch(operation, request);
        match &result {
            Ok(_) => tracing::trace!("sim {} ok", operation),
            Err(e) => tracing::debug!("sim {} failed: {}", operation, e),
        }
        result.map_err(ProviderError::from)
    }
}

#[async_trait]
impl ProviderGateway for SimCloud {
    fn cloud(&self) -> &str {
        "aws"
    }

    async fn invoke(
        &self,
        operation: &str,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        self.call(operation, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_invoke_counts_calls() {
        let sim = SimCloud::new();
        sim.invoke("ec2:DescribeRegions", json!({})).await.unwrap();
        sim.invoke("ec2:DescribeRegions", json!({})).await.unwrap();
        assert_eq!(sim.calls("ec2:DescribeRegions"), 2);
        assert_eq!(sim.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_fault_is_counted_and_spent() {
        let sim = SimCloud::new();
        sim.inject(Fault::on("ec2:DescribeRegions").code("Throttling").times(1));

        let err = sim.invoke("ec2:DescribeRegions", json!({})).await.unwrap_err();
        assert_eq!(err.code, "Throttling");
        assert!(sim.invoke("ec2:DescribeRegions", json!({})).await.is_ok());
        assert_eq!(sim.calls("ec2:DescribeRegions"), 2);
    }

    #[tokio::test]
    async fn test_unsupported_operation() {
        let sim = SimCloud::new();
        let err = sim.invoke("s3:ListBuckets", json!({})).await.unwrap_err();
        assert_eq!(err.code, "InvalidAction");
    }

    #[tokio::test]
    async fn test_default_roles_can_be_removed() {
        let sim = SimCloud::new();
        assert!(sim.remove_role(DEFAULT_ROLES[0]));
        let err = sim
            .invoke("iam:GetRole", json!({ "RoleName": DEFAULT_ROLES[0] }))
            .await
            .unwrap_err();
        assert_eq!(err.code, "NoSuchEntity");
    }

    #[test]
    fn test_failed_creation_settles_in_error() {
        let sim = SimCloud::with_config(SimConfig {
            settle_reads: 0,
            ..Default::default()
        });
        sim.fail_creations("volume", 1);

        let volume = json!({ "AvailabilityZone": "us-east-1a", "Size": 10 });
        let doomed = sim.call("ec2:CreateVolume", volume.clone()).unwrap();
        let healthy = sim.call("ec2:CreateVolume", volume).unwrap();

        let state = |created: &serde_json::Value| {
            let out = sim
                .call(
                    "ec2:DescribeVolumes",
                    json!({ "VolumeIds": [created["VolumeId"]] }),
                )
                .unwrap();
            out["Volumes"][0]["State"].as_str().unwrap_or_default().to_string()
        };
        assert_eq!(state(&doomed), "error");
        assert_eq!(state(&healthy), "available");
    }
}
