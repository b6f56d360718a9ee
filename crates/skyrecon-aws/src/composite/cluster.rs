//! Managed Kubernetes cluster composite
//!
//! Creation looks up the cluster role, creates the control plane, waits
//! for it, then adds every requested node group in order. The cluster name
//! is its provider id. Node group members are found through the autoscaling
//! groups the provider creates for each group.

use crate::context::AwsContext;
use crate::convert::{NODEGROUP_TAG, cluster_to_info, named_tags, normalize_k8s_version, nodegroup_to_info};
use crate::handlers::{absent_on_not_found, require_name};
use crate::ops;
use crate::shapes::*;
use crate::status::{CLUSTER_STATES, NODEGROUP_STATES};
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::*;
use skyrecon_core::{
    ClusterHandler, ClusterStatus, Iid, NodeGroupStatus, ReconError, ResourceKind, Result,
    WaitGoal, WorkflowRun, fan_out,
};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::Cluster;

const STEP_ROLE: &str = "iam-role";
const STEP_CONTROL_PLANE: &str = "control-plane";

fn validate_scaling(desired: u32, min: u32, max: u32) -> Result<()> {
    if max < 1 {
        return Err(ReconError::validation(
            "node group max size must be at least 1",
        ));
    }
    if min > desired || desired > max {
        return Err(ReconError::validation(format!(
            "node group sizes must satisfy min <= desired <= max, got {} <= {} <= {}",
            min, desired, max
        )));
    }
    Ok(())
}

fn validate_node_group(req: &NodeGroupRequest) -> Result<()> {
    require_name(ResourceKind::NodeGroup, &req.name)?;
    validate_scaling(req.desired_size, req.min_size, req.max_size)
}

/// Cluster names are their ids
fn cluster_name(iid: &Iid) -> Result<String> {
    if !iid.provider_id.is_empty() {
        return Ok(iid.provider_id.clone());
    }
    require_name(KIND, &iid.name)?;
    Ok(iid.name.clone())
}

/// Node groups are created under their logical name
fn node_group_name(iid: &Iid) -> Result<String> {
    if !iid.provider_id.is_empty() {
        return Ok(iid.provider_id.clone());
    }
    require_name(ResourceKind::NodeGroup, &iid.name)?;
    Ok(iid.name.clone())
}

// ---------------------------------------------------------------------------
// lookups

async fn role_arn(ctx: &AwsContext, role_name: &str) -> Result<String> {
    let out: GetRoleOutput = ctx
        .invoker
        .call(
            ResourceKind::Role,
            role_name,
            ops::GET_ROLE,
            &json!({ "RoleName": role_name }),
        )
        .await?;
    out.role
        .and_then(|r| r.arn)
        .ok_or_else(|| ReconError::malformed(format!("role {} has no Arn", role_name)))
}

async fn control_plane(ctx: &AwsContext, name: &str) -> Result<Option<Cluster>> {
    let out: Option<ClusterOutput> = absent_on_not_found(
        ctx.invoker
            .call(KIND, name, ops::DESCRIBE_CLUSTER, &json!({ "Name": name }))
            .await,
    )?;
    Ok(out.and_then(|o| o.cluster))
}

async fn cluster_status(ctx: &AwsContext, name: &str) -> Result<Option<ClusterStatus>> {
    Ok(control_plane(ctx, name)
        .await?
        .map(|c| CLUSTER_STATES.normalize(c.status.as_deref())))
}

async fn node_group_names(ctx: &AwsContext, cluster: &str) -> Result<Vec<String>> {
    let out: ListNodegroupsOutput = ctx
        .invoker
        .call(
            ResourceKind::NodeGroup,
            cluster,
            ops::LIST_NODEGROUPS,
            &json!({ "ClusterName": cluster }),
        )
        .await?;
    Ok(out.nodegroups)
}

async fn node_group(ctx: &AwsContext, cluster: &str, name: &str) -> Result<Option<Nodegroup>> {
    let out: Option<NodegroupOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                ResourceKind::NodeGroup,
                name,
                ops::DESCRIBE_NODEGROUP,
                &NodegroupNameInput {
                    cluster_name: cluster.to_string(),
                    nodegroup_name: name.to_string(),
                },
            )
            .await,
    )?;
    Ok(out.and_then(|o| o.nodegroup))
}

async fn node_group_status(ctx: &AwsContext, cluster: &str, name: &str) -> Result<Option<NodeGroupStatus>> {
    Ok(node_group(ctx, cluster, name)
        .await?
        .map(|g| NODEGROUP_STATES.normalize(g.status.as_deref())))
}

/// Instances of the autoscaling groups backing a node group
async fn group_instances(ctx: &AwsContext, group: &Nodegroup) -> Result<Vec<Iid>> {
    let names: Vec<String> = group
        .resources
        .as_ref()
        .map(|r| r.auto_scaling_groups.iter().filter_map(|a| a.name.clone()).collect())
        .unwrap_or_default();
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let out: DescribeAutoScalingGroupsOutput = ctx
        .invoker
        .call(
            ResourceKind::NodeGroup,
            group.nodegroup_name.as_deref().unwrap_or_default(),
            ops::DESCRIBE_AUTO_SCALING_GROUPS,
            &json!({ "AutoScalingGroupNames": names }),
        )
        .await?;
    Ok(out
        .auto_scaling_groups
        .into_iter()
        .flat_map(|g| g.instances)
        .filter_map(|i| i.instance_id)
        .map(Iid::by_id)
        .collect())
}

async fn describe_node_group(ctx: &AwsContext, cluster: &str, name: String) -> Result<NodeGroupInfo> {
    let group = node_group(ctx, cluster, &name)
        .await?
        .ok_or_else(|| ReconError::not_found(ResourceKind::NodeGroup, &name))?;
    let nodes = group_instances(ctx, &group).await?;
    nodegroup_to_info(group, nodes)
}

/// Re-derive the cluster with every node group that can be described
async fn describe(ctx: &AwsContext, name: &str) -> Result<ClusterInfo> {
    let cluster = control_plane(ctx, name)
        .await?
        .ok_or_else(|| ReconError::not_found(KIND, name))?;
    let names = node_group_names(ctx, name).await?;

    let mut node_groups = fan_out(ResourceKind::NodeGroup, names, ctx.concurrency(), |ng| {
        describe_node_group(ctx, name, ng)
    })
    .await;
    node_groups.sort_by(|a, b| a.iid.provider_id.cmp(&b.iid.provider_id));

    cluster_to_info(cluster, node_groups)
}

// ---------------------------------------------------------------------------
// sub-resource lifecycle

async fn create_control_plane(ctx: &AwsContext, req: &ClusterRequest, role_arn: String) -> Result<String> {
    let version = if req.version.trim().is_empty() {
        None
    } else {
        Some(normalize_k8s_version(&req.version))
    };

    let out: ClusterOutput = ctx
        .invoker
        .call(
            KIND,
            &req.name,
            ops::CREATE_CLUSTER,
            &CreateClusterInput {
                name: req.name.clone(),
                version,
                role_arn,
                resources_vpc_config: VpcConfig {
                    vpc_id: Some(req.network.vpc_id.clone()),
                    subnet_ids: req.network.subnet_ids.clone(),
                    security_group_ids: req.network.security_group_ids.clone(),
                },
                tags: named_tags(&req.name, &req.tags),
            },
        )
        .await?;
    out.cluster
        .and_then(|c| c.name)
        .ok_or_else(|| ReconError::malformed("CreateCluster returned no cluster name"))
}

async fn wait_cluster(ctx: &AwsContext, name: &str, goal: WaitGoal<'_, ClusterStatus>) -> Result<()> {
    let dead_ends: &[ClusterStatus] = match goal {
        WaitGoal::Reach(_) => &[ClusterStatus::Deleting, ClusterStatus::Error],
        WaitGoal::Gone(_) => &[ClusterStatus::Error],
    };
    ctx.waiter(KIND)
        .await_status(KIND, name, goal, dead_ends, || cluster_status(ctx, name))
        .await
        .map(|_| ())
}

async fn delete_control_plane(ctx: &AwsContext, name: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(KIND, &name, ops::DELETE_CLUSTER, &ClusterNameInput {
                name: name.clone(),
            })
            .await,
    )?;
    wait_cluster(ctx, &name, WaitGoal::Gone(&[])).await
}

async fn create_node_group(
    ctx: &AwsContext,
    cluster: &str,
    subnets: &[String],
    req: &NodeGroupRequest,
) -> Result<String> {
    validate_node_group(req)?;
    let node_role = role_arn(ctx, &ctx.roles().node_group_role).await?;

    let mut tags = named_tags(&req.name, &[]);
    tags.push(Tag {
        key: NODEGROUP_TAG.to_string(),
        value: req.name.clone(),
    });

    let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
    let out: NodegroupOutput = ctx
        .invoker
        .call(
            ResourceKind::NodeGroup,
            &req.name,
            ops::CREATE_NODEGROUP,
            &CreateNodegroupInput {
                cluster_name: cluster.to_string(),
                nodegroup_name: req.name.clone(),
                node_role,
                subnets: subnets.to_vec(),
                instance_types: non_empty(&req.vm_spec).into_iter().collect(),
                ami_type: non_empty(&req.image),
                disk_size: req.root_disk_size,
                scaling_config: ScalingConfig {
                    min_size: Some(req.min_size),
                    max_size: Some(req.max_size),
                    desired_size: Some(req.desired_size),
                },
                remote_access: req.key_pair.as_ref().map(|k| RemoteAccess {
                    ec2_ssh_key: Some(if k.name.is_empty() {
                        k.provider_id.clone()
                    } else {
                        k.name.clone()
                    }),
                }),
                tags,
            },
        )
        .await?;
    out.nodegroup
        .and_then(|g| g.nodegroup_name)
        .ok_or_else(|| ReconError::malformed("CreateNodegroup returned no NodegroupName"))
}

async fn wait_node_group(
    ctx: &AwsContext,
    cluster: &str,
    name: &str,
    goal: WaitGoal<'_, NodeGroupStatus>,
) -> Result<()> {
    let dead_ends: &[NodeGroupStatus] = match goal {
        WaitGoal::Reach(_) => &[NodeGroupStatus::Deleting, NodeGroupStatus::Error],
        WaitGoal::Gone(_) => &[NodeGroupStatus::Error],
    };
    ctx.waiter(ResourceKind::NodeGroup)
        .await_status(ResourceKind::NodeGroup, name, goal, dead_ends, || {
            node_group_status(ctx, cluster, name)
        })
        .await
        .map(|_| ())
}

/// Start deleting a node group; false when it was already gone
async fn start_node_group_delete(ctx: &AwsContext, cluster: &str, name: &str) -> Result<bool> {
    let deleted = absent_on_not_found(
        ctx.invoker
            .call_unit(
                ResourceKind::NodeGroup,
                name,
                ops::DELETE_NODEGROUP,
                &NodegroupNameInput {
                    cluster_name: cluster.to_string(),
                    nodegroup_name: name.to_string(),
                },
            )
            .await,
    )?;
    Ok(deleted.is_some())
}

async fn delete_node_group(ctx: &AwsContext, cluster: String, name: String) -> Result<()> {
    if start_node_group_delete(ctx, &cluster, &name).await? {
        wait_node_group(ctx, &cluster, &name, WaitGoal::Gone(&[])).await?;
    }
    Ok(())
}

/// Create one node group and wait until it serves nodes
async fn add_node_group_to(
    ctx: &AwsContext,
    cluster: &str,
    subnets: &[String],
    req: &NodeGroupRequest,
) -> Result<NodeGroupInfo> {
    let name = create_node_group(ctx, cluster, subnets, req).await?;
    wait_node_group(ctx, cluster, &name, WaitGoal::Reach(&[NodeGroupStatus::Active])).await?;
    describe_node_group(ctx, cluster, name).await
}

// ---------------------------------------------------------------------------

pub struct AwsClusterHandler {
    ctx: Arc<AwsContext>,
}

impl AwsClusterHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ClusterHandler for AwsClusterHandler {
    async fn create(&self, req: ClusterRequest) -> Result<ClusterInfo> {
        let ctx: &AwsContext = &self.ctx;
        require_name(KIND, &req.name)?;
        if req.network.vpc_id.trim().is_empty() || req.network.subnet_ids.is_empty() {
            return Err(ReconError::validation(
                "cluster network needs a vpc id and at least one subnet",
            ));
        }
        for group in &req.node_groups {
            validate_node_group(group)?;
        }
        if control_plane(ctx, &req.name).await?.is_some() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let mut run = WorkflowRun::new(KIND, &req.name, ctx.composite_policy());

        let cluster_role = run
            .step(STEP_ROLE, role_arn(ctx, &ctx.roles().cluster_role))
            .await?;

        let name = run
            .step(STEP_CONTROL_PLANE, create_control_plane(ctx, &req, cluster_role))
            .await?;
        run.record_with_undo(
            KIND,
            &name,
            STEP_CONTROL_PLANE,
            Box::pin(delete_control_plane(ctx, name.clone())),
        );
        run.step(
            STEP_CONTROL_PLANE,
            wait_cluster(ctx, &name, WaitGoal::Reach(&[ClusterStatus::Active])),
        )
        .await?;
        tracing::info!("cluster {} control plane is active", name);

        for group in &req.node_groups {
            let step = format!("node-group:{}", group.name);
            let ng_name = run
                .step(
                    &step,
                    create_node_group(ctx, &name, &req.network.subnet_ids, group),
                )
                .await?;
            run.record_with_undo(
                ResourceKind::NodeGroup,
                &ng_name,
                &step,
                Box::pin(delete_node_group(ctx, name.clone(), ng_name.clone())),
            );
            run.step(
                &step,
                wait_node_group(ctx, &name, &ng_name, WaitGoal::Reach(&[NodeGroupStatus::Active])),
            )
            .await?;
            tracing::info!("cluster {} node group {} is active", name, ng_name);
        }

        run.step(STEP_CONTROL_PLANE, describe(ctx, &name)).await
    }

    async fn list(&self) -> Result<Vec<ClusterInfo>> {
        let ctx: &AwsContext = &self.ctx;
        let out: ListClustersOutput = ctx
            .invoker
            .call(KIND, "*", ops::LIST_CLUSTERS, &json!({}))
            .await?;

        Ok(fan_out(KIND, out.clusters, ctx.concurrency(), |name| async move {
            describe(ctx, &name).await
        })
        .await)
    }

    async fn get(&self, iid: &Iid) -> Result<ClusterInfo> {
        let name = cluster_name(iid)?;
        describe(&self.ctx, &name).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let ctx: &AwsContext = &self.ctx;
        let name = cluster_name(iid)?;
        match control_plane(ctx, &name).await? {
            None => return Ok(true),
            Some(c) if CLUSTER_STATES.normalize(c.status.as_deref()) == ClusterStatus::Deleting => {
                wait_cluster(ctx, &name, WaitGoal::Gone(&[])).await?;
                return Ok(true);
            }
            Some(_) => {}
        }

        // node groups must be gone before the control plane can go
        let groups = absent_on_not_found(node_group_names(ctx, &name).await)?.unwrap_or_default();
        let mut pending = Vec::new();
        for group in groups {
            if start_node_group_delete(ctx, &name, &group).await? {
                pending.push(group);
            }
        }
        for group in &pending {
            wait_node_group(ctx, &name, group, WaitGoal::Gone(&[])).await?;
        }

        delete_control_plane(ctx, name.clone()).await?;
        tracing::info!("deleted cluster {}", name);
        Ok(true)
    }

    async fn add_node_group(&self, cluster: &Iid, req: NodeGroupRequest) -> Result<NodeGroupInfo> {
        let ctx: &AwsContext = &self.ctx;
        validate_node_group(&req)?;
        let name = cluster_name(cluster)?;
        let control = control_plane(ctx, &name)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, &name))?;

        if node_group(ctx, &name, &req.name).await?.is_some() {
            return Err(ReconError::AlreadyExists {
                kind: ResourceKind::NodeGroup,
                name: req.name,
            });
        }

        let subnets = control
            .resources_vpc_config
            .map(|v| v.subnet_ids)
            .unwrap_or_default();
        add_node_group_to(ctx, &name, &subnets, &req).await
    }

    async fn remove_node_group(&self, cluster: &Iid, node_group: &Iid) -> Result<bool> {
        let name = cluster_name(cluster)?;
        let group = node_group_name(node_group)?;
        delete_node_group(&self.ctx, name, group).await?;
        Ok(true)
    }

    async fn scale_node_group(
        &self,
        cluster: &Iid,
        node_group: &Iid,
        scaling: NodeGroupScaling,
    ) -> Result<NodeGroupInfo> {
        let ctx: &AwsContext = &self.ctx;
        validate_scaling(scaling.desired_size, scaling.min_size, scaling.max_size)?;
        let name = cluster_name(cluster)?;
        let group = node_group_name(node_group)?;

        ctx.invoker
            .call_unit(
                ResourceKind::NodeGroup,
                &group,
                ops::UPDATE_NODEGROUP_CONFIG,
                &UpdateNodegroupConfigInput {
                    cluster_name: name.clone(),
                    nodegroup_name: group.clone(),
                    scaling_config: ScalingConfig {
                        min_size: Some(scaling.min_size),
                        max_size: Some(scaling.max_size),
                        desired_size: Some(scaling.desired_size),
                    },
                },
            )
            .await?;

        wait_node_group(ctx, &name, &group, WaitGoal::Reach(&[NodeGroupStatus::Active])).await?;
        describe_node_group(ctx, &name, group).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_bounds() {
        assert!(validate_scaling(2, 1, 3).is_ok());
        assert!(validate_scaling(0, 0, 1).is_ok());
        assert!(validate_scaling(0, 0, 0).is_err());
        assert!(validate_scaling(4, 1, 3).is_err());
        assert!(validate_scaling(1, 2, 3).is_err());
    }

    #[test]
    fn test_names_prefer_provider_id() {
        assert_eq!(cluster_name(&Iid::new("a", "b")).unwrap(), "b");
        assert_eq!(cluster_name(&Iid::by_name("a")).unwrap(), "a");
        assert!(cluster_name(&Iid::default()).is_err());
        assert_eq!(node_group_name(&Iid::by_name("workers")).unwrap(), "workers");
    }
}
