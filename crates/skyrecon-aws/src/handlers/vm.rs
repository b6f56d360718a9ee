//! Virtual machine lifecycle

use super::{
    absent_on_not_found, convert_all, describe_instance, instance_ids_by_name, key_pair,
    require_name, resolve_vm, security_group,
};
use crate::context::AwsContext;
use crate::convert::{instance_to_vm, named_tags, tag_spec};
use crate::ops;
use crate::shapes::*;
use crate::status::INSTANCE_STATES;
use async_trait::async_trait;
use skyrecon_core::model::{VmInfo, VmRequest};
use skyrecon_core::{Iid, ReconError, ResourceKind, Result, VmHandler, VmStatus, WaitGoal};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::Vm;

/// Statuses a start/stop/reboot cannot recover from
const LOST: [VmStatus; 3] = [VmStatus::Terminating, VmStatus::Terminated, VmStatus::Error];

pub struct AwsVmHandler {
    ctx: Arc<AwsContext>,
}

impl AwsVmHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn probe(&self, id: &str) -> Result<Option<VmStatus>> {
        Ok(describe_instance(&self.ctx, id).await?.map(|i| {
            INSTANCE_STATES.normalize(i.state.as_ref().and_then(|s| s.name.as_deref()))
        }))
    }

    async fn wait_for(
        &self,
        id: &str,
        goal: WaitGoal<'_, VmStatus>,
        dead_ends: &[VmStatus],
    ) -> Result<Option<VmStatus>> {
        self.ctx
            .waiter(KIND)
            .await_status(KIND, id, goal, dead_ends, || self.probe(id))
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<VmInfo> {
        let instance = describe_instance(&self.ctx, id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, id))?;
        instance_to_vm(instance)
    }

    /// Send a power operation and wait for `target`
    async fn transition(&self, iid: &Iid, operation: &str, target: VmStatus) -> Result<VmStatus> {
        let id = resolve_vm(&self.ctx, iid).await?;
        self.ctx
            .invoker
            .call_unit(KIND, &id, operation, &InstanceIdsInput {
                instance_ids: vec![id.clone()],
            })
            .await?;

        let status = self
            .wait_for(&id, WaitGoal::Reach(&[target]), &LOST)
            .await?;
        Ok(status.unwrap_or(target))
    }
}

#[async_trait]
impl VmHandler for AwsVmHandler {
    async fn create(&self, req: VmRequest) -> Result<VmInfo> {
        require_name(KIND, &req.name)?;
        if req.image.trim().is_empty() {
            return Err(ReconError::validation("vm image is required"));
        }
        if req.vm_spec.trim().is_empty() {
            return Err(ReconError::validation("vm spec is required"));
        }

        if !instance_ids_by_name(&self.ctx, req.name.clone())
            .await?
            .is_empty()
        {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let key_name = match &req.key_pair {
            Some(iid) => Some(key_pair::key_name(&self.ctx, iid).await?),
            None => None,
        };
        let mut security_group_ids = Vec::with_capacity(req.security_groups.len());
        for group in &req.security_groups {
            security_group_ids.push(security_group::resolve(&self.ctx, group).await?);
        }

        let input = RunInstancesInput {
            image_id: req.image.clone(),
            instance_type: req.vm_spec.clone(),
            key_name,
            security_group_ids,
            subnet_id: req.subnet_id.clone(),
            min_count: 1,
            max_count: 1,
            tag_specifications: tag_spec("instance", named_tags(&req.name, &req.tags)),
        };
        let out: RunInstancesOutput = self
            .ctx
            .invoker
            .call(KIND, &req.name, ops::RUN_INSTANCES, &input)
            .await?;
        let id = out
            .instances
            .into_iter()
            .next()
            .and_then(|i| i.instance_id)
            .ok_or_else(|| ReconError::malformed("RunInstances returned no instance"))?;

        tracing::info!("launched vm {} ({})", req.name, id);
        self.wait_for(&id, WaitGoal::Reach(&[VmStatus::Running]), &LOST)
            .await?;
        self.get_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<VmInfo>> {
        let out: DescribeInstancesOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_INSTANCES, &DescribeInput::default())
            .await?;
        Ok(convert_all(KIND, out.into_instances(), instance_to_vm))
    }

    async fn get(&self, iid: &Iid) -> Result<VmInfo> {
        let id = resolve_vm(&self.ctx, iid).await?;
        self.get_by_id(&id).await
    }

    async fn status(&self, iid: &Iid) -> Result<VmStatus> {
        let id = resolve_vm(&self.ctx, iid).await?;
        self.probe(&id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, id))
    }

    async fn start(&self, iid: &Iid) -> Result<VmStatus> {
        self.transition(iid, ops::START_INSTANCES, VmStatus::Running)
            .await
    }

    async fn stop(&self, iid: &Iid) -> Result<VmStatus> {
        self.transition(iid, ops::STOP_INSTANCES, VmStatus::Suspended)
            .await
    }

    async fn reboot(&self, iid: &Iid) -> Result<VmStatus> {
        self.transition(iid, ops::REBOOT_INSTANCES, VmStatus::Running)
            .await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let Some(id) = absent_on_not_found(resolve_vm(&self.ctx, iid).await)? else {
            return Ok(true);
        };

        match self.probe(&id).await? {
            None | Some(VmStatus::Terminated) => {
                tracing::debug!("vm {} already terminated", id);
                return Ok(true);
            }
            Some(VmStatus::Terminating) => {}
            Some(_) => {
                let terminated = self
                    .ctx
                    .invoker
                    .call_unit(KIND, &id, ops::TERMINATE_INSTANCES, &InstanceIdsInput {
                        instance_ids: vec![id.clone()],
                    })
                    .await;
                if let Err(e) = terminated {
                    if !e.is_not_found() {
                        return Err(e);
                    }
                }
            }
        }

        self.wait_for(&id, WaitGoal::Gone(&[VmStatus::Terminated]), &[])
            .await?;
        Ok(true)
    }
}
