//! Block storage volumes

use super::{absent_on_not_found, convert_all, describe_instance, require_name, resolve_vm};
use crate::context::AwsContext;
use crate::convert::{named_tags, tag_spec, volume_to_disk};
use crate::ops;
use crate::shapes::*;
use crate::status::disk_status;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::{DiskInfo, DiskRequest};
use skyrecon_core::{DiskHandler, DiskStatus, Iid, ReconError, ResourceKind, Result, WaitGoal};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::Disk;

/// Device names handed out to data volumes, in order
const DEVICE_NAMES: [&str; 11] = [
    "/dev/sdf", "/dev/sdg", "/dev/sdh", "/dev/sdi", "/dev/sdj", "/dev/sdk", "/dev/sdl",
    "/dev/sdm", "/dev/sdn", "/dev/sdo", "/dev/sdp",
];

pub(crate) async fn lookup(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: DescribeVolumesOutput = ctx
        .invoker
        .call(
            KIND,
            &name,
            ops::DESCRIBE_VOLUMES,
            &DescribeInput {
                filters: vec![Filter::name_tag(&name)],
            },
        )
        .await?;
    Ok(out
        .volumes
        .into_iter()
        .filter(|v| v.state.as_deref() != Some("deleted"))
        .filter_map(|v| v.volume_id)
        .collect())
}

pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| lookup(ctx, name)).await
}

pub struct AwsDiskHandler {
    ctx: Arc<AwsContext>,
}

impl AwsDiskHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn describe(&self, id: &str) -> Result<Option<Volume>> {
        let out: Option<DescribeVolumesOutput> = absent_on_not_found(
            self.ctx
                .invoker
                .call(KIND, id, ops::DESCRIBE_VOLUMES, &json!({ "VolumeIds": [id] }))
                .await,
        )?;
        Ok(out.and_then(|o| o.volumes.into_iter().next()))
    }

    /// Status as seen from `instance_id`, `None` when the volume is gone
    async fn probe(&self, id: &str, instance_id: Option<&str>) -> Result<Option<DiskStatus>> {
        Ok(self.describe(id).await?.map(|v| {
            let owner = instance_id
                .map(String::from)
                .or_else(|| v.attachments.first().and_then(|a| a.instance_id.clone()));
            disk_status(v.state.as_deref(), &v.attachments, owner.as_deref())
        }))
    }

    async fn wait_for(
        &self,
        id: &str,
        goal: WaitGoal<'_, DiskStatus>,
        dead_ends: &[DiskStatus],
        instance_id: Option<&str>,
    ) -> Result<Option<DiskStatus>> {
        self.ctx
            .waiter(KIND)
            .await_status(KIND, id, goal, dead_ends, || self.probe(id, instance_id))
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<DiskInfo> {
        let volume = self
            .describe(id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, id))?;
        volume_to_disk(volume)
    }

    /// First device name not used by the instance
    async fn free_device(&self, instance_id: &str) -> Result<String> {
        let instance = describe_instance(&self.ctx, instance_id)
            .await?
            .ok_or_else(|| ReconError::not_found(ResourceKind::Vm, instance_id))?;

        let used: Vec<String> = instance
            .block_device_mappings
            .iter()
            .filter_map(|m| m.device_name.clone())
            .collect();

        DEVICE_NAMES
            .iter()
            .find(|d| !used.iter().any(|u| u == *d))
            .map(|d| d.to_string())
            .ok_or_else(|| ReconError::ResourceInUse {
                kind: ResourceKind::Vm,
                id: format!("{} (no free device name)", instance_id),
            })
    }
}

#[async_trait]
impl DiskHandler for AwsDiskHandler {
    async fn create(&self, req: DiskRequest) -> Result<DiskInfo> {
        require_name(KIND, &req.name)?;
        let (disk_type, size) = self
            .ctx
            .catalog()
            .validate_create(&req.disk_type, &req.disk_size)?;

        if !lookup(&self.ctx, req.name.clone()).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let input = CreateVolumeInput {
            availability_zone: req.zone.clone().unwrap_or_else(|| self.ctx.zone()),
            size,
            volume_type: disk_type,
            tag_specifications: tag_spec("volume", named_tags(&req.name, &req.tags)),
        };
        let volume: Volume = self
            .ctx
            .invoker
            .call(KIND, &req.name, ops::CREATE_VOLUME, &input)
            .await?;
        let id = volume
            .volume_id
            .ok_or_else(|| ReconError::malformed("CreateVolume returned no VolumeId"))?;

        tracing::info!("created disk {} ({})", req.name, id);
        self.wait_for(
            &id,
            WaitGoal::Reach(&[DiskStatus::Available]),
            &[DiskStatus::Deleting, DiskStatus::Deleted, DiskStatus::Error],
            None,
        )
        .await?;
        self.get_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<DiskInfo>> {
        let out: DescribeVolumesOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_VOLUMES, &DescribeInput::default())
            .await?;
        Ok(convert_all(KIND, out.volumes, volume_to_disk))
    }

    async fn get(&self, iid: &Iid) -> Result<DiskInfo> {
        let id = resolve(&self.ctx, iid).await?;
        self.get_by_id(&id).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let Some(id) = absent_on_not_found(resolve(&self.ctx, iid).await)? else {
            return Ok(true);
        };

        match self.probe(&id, None).await? {
            None | Some(DiskStatus::Deleted) => {
                tracing::debug!("disk {} already gone", id);
                return Ok(true);
            }
            Some(DiskStatus::Deleting) => {}
            Some(_) => {
                let deleted = self
                    .ctx
                    .invoker
                    .call_unit(KIND, &id, ops::DELETE_VOLUME, &json!({ "VolumeId": id }))
                    .await;
                if let Err(e) = deleted {
                    if !e.is_not_found() {
                        return Err(e);
                    }
                    tracing::warn!("disk {} vanished before delete", id);
                }
            }
        }

        self.wait_for(&id, WaitGoal::Gone(&[DiskStatus::Deleted]), &[], None)
            .await?;
        Ok(true)
    }

    async fn attach(&self, disk: &Iid, vm: &Iid) -> Result<DiskInfo> {
        let id = resolve(&self.ctx, disk).await?;
        let instance_id = resolve_vm(&self.ctx, vm).await?;
        let device = self.free_device(&instance_id).await?;

        self.ctx
            .invoker
            .call_unit(
                KIND,
                &id,
                ops::ATTACH_VOLUME,
                &json!({ "VolumeId": id, "InstanceId": instance_id, "Device": device }),
            )
            .await?;

        self.wait_for(
            &id,
            WaitGoal::Reach(&[DiskStatus::Attached]),
            &[DiskStatus::Deleting, DiskStatus::Deleted, DiskStatus::Error],
            Some(&instance_id),
        )
        .await?;
        self.get_by_id(&id).await
    }

    async fn detach(&self, disk: &Iid, vm: &Iid) -> Result<bool> {
        let id = resolve(&self.ctx, disk).await?;
        let instance_id = resolve_vm(&self.ctx, vm).await?;

        self.ctx
            .invoker
            .call_unit(
                KIND,
                &id,
                ops::DETACH_VOLUME,
                &json!({ "VolumeId": id, "InstanceId": instance_id }),
            )
            .await?;

        self.wait_for(
            &id,
            WaitGoal::Reach(&[DiskStatus::Available]),
            &[DiskStatus::Deleting, DiskStatus::Deleted, DiskStatus::Error],
            Some(&instance_id),
        )
        .await?;
        Ok(true)
    }

    async fn change_size(&self, disk: &Iid, size: &str) -> Result<DiskInfo> {
        let id = resolve(&self.ctx, disk).await?;
        let current = self.get_by_id(&id).await?;
        let new_size = self
            .ctx
            .catalog()
            .validate_resize(&current.disk_type, current.disk_size, size)?;

        let out: ModifyVolumeOutput = self
            .ctx
            .invoker
            .call(
                KIND,
                &id,
                ops::MODIFY_VOLUME,
                &json!({ "VolumeId": id, "Size": new_size }),
            )
            .await?;
        if let Some(m) = out.volume_modification {
            tracing::info!(
                "disk {} resize {:?} -> {:?} ({})",
                id,
                m.original_size,
                m.target_size,
                m.modification_state.as_deref().unwrap_or("submitted")
            );
        }

        self.get_by_id(&id).await
    }
}
