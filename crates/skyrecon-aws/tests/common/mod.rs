//! Shared fixtures for the adapter tests

#![allow(dead_code)]

use skyrecon_aws::{AwsDriver, AwsSettings};
use skyrecon_core::model::{VmInfo, VmRequest};
use skyrecon_core::{CloudDriver, MemoryCallLogger, WaitConfig, WaitPolicy};
use skyrecon_sim::SimCloud;
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub sim: Arc<SimCloud>,
    pub log: Arc<MemoryCallLogger>,
    pub driver: AwsDriver,
}

pub fn settings() -> AwsSettings {
    AwsSettings {
        region: "us-east-1".to_string(),
        wait: WaitPolicy::uniform(WaitConfig::fixed(
            Duration::from_millis(1),
            Duration::from_secs(2),
        )),
        ..Default::default()
    }
}

pub fn harness() -> Harness {
    harness_with(settings())
}

pub fn harness_with(settings: AwsSettings) -> Harness {
    let sim = Arc::new(SimCloud::new());
    let log = Arc::new(MemoryCallLogger::new());
    let driver = AwsDriver::new(sim.clone(), log.clone(), settings);
    Harness { sim, log, driver }
}

pub async fn running_vm(h: &Harness, name: &str) -> VmInfo {
    h.driver
        .vms()
        .create(VmRequest {
            name: name.to_string(),
            image: "ami-0abcdef1234567890".to_string(),
            vm_spec: "t3.micro".to_string(),
            ..Default::default()
        })
        .await
        .expect("vm should launch")
}
