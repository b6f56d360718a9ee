//! Single-resource handlers

mod disk;
mod image;
mod key_pair;
mod public_ip;
mod region;
mod security_group;
mod tag;
mod vm;

pub use disk::AwsDiskHandler;
pub use image::AwsImageHandler;
pub use key_pair::AwsKeyPairHandler;
pub use public_ip::AwsPublicIpHandler;
pub use region::AwsRegionZoneHandler;
pub use security_group::AwsSecurityGroupHandler;
pub use tag::AwsTagHandler;
pub use vm::AwsVmHandler;

use crate::context::AwsContext;
use crate::ops;
use crate::shapes::{DescribeInstancesOutput, Filter, Instance};
use serde_json::json;
use skyrecon_core::{Iid, ReconError, ResourceKind, Result};

/// Map a not-found failure to `None`
pub(crate) fn absent_on_not_found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Convert every item, dropping and logging those that fail
pub(crate) fn convert_all<W, T>(
    kind: ResourceKind,
    items: Vec<W>,
    convert: impl Fn(W) -> Result<T>,
) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match convert(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("skipping {}: {}", kind, e);
                None
            }
        })
        .collect()
}

pub(crate) fn require_name(kind: ResourceKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ReconError::validation(format!("{} name is required", kind)));
    }
    Ok(())
}

pub(crate) async fn describe_instance(ctx: &AwsContext, id: &str) -> Result<Option<Instance>> {
    let out: Option<DescribeInstancesOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                ResourceKind::Vm,
                id,
                ops::DESCRIBE_INSTANCES,
                &json!({ "InstanceIds": [id] }),
            )
            .await,
    )?;
    Ok(out.and_then(|o| o.into_instances().into_iter().next()))
}

/// Ids of non-terminated instances whose `Name` tag is `name`
pub(crate) async fn instance_ids_by_name(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: DescribeInstancesOutput = ctx
        .invoker
        .call(
            ResourceKind::Vm,
            &name,
            ops::DESCRIBE_INSTANCES,
            &json!({
                "Filters": [
                    Filter::name_tag(&name),
                    Filter {
                        name: "instance-state-name".into(),
                        values: vec![
                            "pending".into(),
                            "running".into(),
                            "stopping".into(),
                            "stopped".into(),
                        ],
                    },
                ]
            }),
        )
        .await?;
    Ok(out
        .into_instances()
        .into_iter()
        .filter_map(|i| i.instance_id)
        .collect())
}

pub(crate) async fn resolve_vm(ctx: &AwsContext, vm: &Iid) -> Result<String> {
    skyrecon_core::resolve(ResourceKind::Vm, vm, |name| instance_ids_by_name(ctx, name)).await
}

/// Provider id of any resource kind, resolving names the way each kind's
/// handler does
pub(crate) async fn resolve_any(ctx: &AwsContext, kind: ResourceKind, iid: &Iid) -> Result<String> {
    match kind {
        ResourceKind::Vm => resolve_vm(ctx, iid).await,
        ResourceKind::Disk => disk::resolve(ctx, iid).await,
        ResourceKind::Image => image::resolve(ctx, iid).await,
        ResourceKind::KeyPair => key_pair::resolve(ctx, iid).await,
        ResourceKind::SecurityGroup => security_group::resolve(ctx, iid).await,
        ResourceKind::PublicIp => public_ip::resolve(ctx, iid).await,
        ResourceKind::LoadBalancer | ResourceKind::TargetGroup => {
            crate::composite::load_balancer::resolve(ctx, iid).await
        }
        ResourceKind::Vpc => crate::composite::vpc::resolve(ctx, iid).await,
        // cluster names are their ids
        ResourceKind::Cluster => {
            if iid.provider_id.is_empty() {
                require_name(kind, &iid.name)?;
                Ok(iid.name.clone())
            } else {
                Ok(iid.provider_id.clone())
            }
        }
        _ => {
            if iid.provider_id.is_empty() {
                Err(ReconError::validation(format!(
                    "{} must be addressed by provider id",
                    kind
                )))
            } else {
                Ok(iid.provider_id.clone())
            }
        }
    }
}
