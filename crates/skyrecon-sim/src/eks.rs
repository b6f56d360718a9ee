//! Managed Kubernetes service, with the IAM roles and auto scaling groups
//! it leans on

use crate::error::{SimError, SimResult};
use crate::world::{Lifecycle, TagInput, World, now, parse};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Roles present in every new simulated account
pub const DEFAULT_ROLES: [&str; 2] = ["skyrecon-eks-cluster-role", "skyrecon-eks-nodegroup-role"];

const DEFAULT_VERSION: &str = "1.29";

#[derive(Debug, Default)]
pub(crate) struct EksState {
    roles: BTreeMap<String, String>,
    clusters: BTreeMap<String, Cluster>,
    node_groups: BTreeMap<(String, String), NodeGroup>,
}

#[derive(Debug)]
struct Cluster {
    arn: String,
    version: String,
    role_arn: String,
    vpc: VpcInput,
    created: String,
    life: Lifecycle,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Scaling {
    min_size: Option<u32>,
    max_size: Option<u32>,
    desired_size: Option<u32>,
}

#[derive(Debug)]
struct NodeGroup {
    arn: String,
    instance_types: Vec<String>,
    ami_type: String,
    disk_size: u32,
    node_role: String,
    subnets: Vec<String>,
    min: u32,
    max: u32,
    desired: u32,
    ssh_key: Option<String>,
    asg: String,
    instances: Vec<String>,
    created: String,
    life: Lifecycle,
}

impl EksState {
    pub(crate) fn seed_default_roles(&mut self, account: &str) {
        for role in DEFAULT_ROLES {
            self.add_role(account, role);
        }
    }

    pub(crate) fn add_role(&mut self, account: &str, name: &str) {
        self.roles.insert(
            name.to_string(),
            format!("arn:aws:iam::{}:role/{}", account, name),
        );
    }

    pub(crate) fn remove_role(&mut self, name: &str) -> bool {
        self.roles.remove(name).is_some()
    }
}

pub(crate) fn handle(world: &mut World, service: &str, action: &str, request: Value) -> SimResult<Value> {
    match (service, action) {
        ("iam", "GetRole") => get_role(world, parse(request)?),
        ("eks", "CreateCluster") => create_cluster(world, parse(request)?),
        ("eks", "DescribeCluster") => describe_cluster(world, parse(request)?),
        ("eks", "ListClusters") => Ok(json!({
            "Clusters": world.eks.clusters.keys().collect::<Vec<_>>()
        })),
        ("eks", "DeleteCluster") => delete_cluster(world, parse(request)?),
        ("eks", "CreateNodegroup") => create_node_group(world, parse(request)?),
        ("eks", "DescribeNodegroup") => describe_node_group(world, parse(request)?),
        ("eks", "ListNodegroups") => list_node_groups(world, parse(request)?),
        ("eks", "DeleteNodegroup") => delete_node_group(world, parse(request)?),
        ("eks", "UpdateNodegroupConfig") => update_node_group(world, parse(request)?),
        ("autoscaling", "DescribeAutoScalingGroups") => describe_groups(world, parse(request)?),
        _ => Err(SimError::Unsupported(format!("{}:{}", service, action))),
    }
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::api("InvalidParameterException", message)
}

fn cluster_not_found(name: &str) -> SimError {
    SimError::api(
        "ResourceNotFoundException",
        format!("No cluster found for name: {}.", name),
    )
}

fn node_group_not_found(name: &str) -> SimError {
    SimError::api(
        "ResourceNotFoundException",
        format!("No node group found for name: {}.", name),
    )
}

// ---------------------------------------------------------------------------
// IAM

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleRequest {
    role_name: String,
}

fn get_role(world: &mut World, req: RoleRequest) -> SimResult<Value> {
    let arn = world.eks.roles.get(&req.role_name).ok_or_else(|| {
        SimError::api(
            "NoSuchEntity",
            format!("The role with name {} cannot be found.", req.role_name),
        )
    })?;
    Ok(json!({ "Role": { "RoleName": req.role_name, "Arn": arn } }))
}

// ---------------------------------------------------------------------------
// Clusters

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct VpcInput {
    vpc_id: Option<String>,
    subnet_ids: Vec<String>,
    security_group_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateClusterRequest {
    name: String,
    #[serde(default)]
    version: Option<String>,
    role_arn: String,
    resources_vpc_config: VpcInput,
    #[serde(default)]
    tags: Vec<TagInput>,
}

fn create_cluster(world: &mut World, req: CreateClusterRequest) -> SimResult<Value> {
    if req.name.is_empty() || req.name.len() > 100 {
        return Err(invalid("cluster name must be 1 to 100 characters"));
    }
    if world.eks.clusters.contains_key(&req.name) {
        return Err(SimError::api(
            "ResourceInUseException",
            format!("Cluster already exists with name: {}", req.name),
        ));
    }
    if !world.eks.roles.values().any(|arn| *arn == req.role_arn) {
        return Err(invalid(format!("role {} does not exist", req.role_arn)));
    }
    if req.resources_vpc_config.subnet_ids.is_empty() {
        return Err(invalid("at least one subnet is required"));
    }
    let arn = world.arn("eks", &format!("cluster/{}", req.name));
    world.tags.register(&req.name, "eks:cluster", &req.tags);
    world.eks.clusters.insert(
        req.name.clone(),
        Cluster {
            arn,
            version: req.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            role_arn: req.role_arn,
            vpc: req.resources_vpc_config,
            created: now(),
            life: Lifecycle::moving("CREATING", Some("ACTIVE"), world.config.settle_reads),
        },
    );
    Ok(json!({ "Cluster": render_cluster(world, &req.name) }))
}

fn render_cluster(world: &World, name: &str) -> Value {
    let Some(c) = world.eks.clusters.get(name) else {
        return Value::Null;
    };
    let endpoint = c.life.is("ACTIVE").then(|| {
        format!(
            "https://{}.gr7.{}.eks.amazonaws.com",
            name.to_uppercase(),
            world.config.region
        )
    });
    json!({
        "Name": name,
        "Arn": c.arn,
        "Version": c.version,
        "Status": c.life.state,
        "Endpoint": endpoint,
        "CreatedAt": c.created,
        "RoleArn": c.role_arn,
        "ResourcesVpcConfig": {
            "VpcId": c.vpc.vpc_id,
            "SubnetIds": c.vpc.subnet_ids,
            "SecurityGroupIds": c.vpc.security_group_ids,
        },
        "Tags": world.tags.render(name),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClusterNameRequest {
    name: String,
}

fn describe_cluster(world: &mut World, req: ClusterNameRequest) -> SimResult<Value> {
    let cluster = world
        .eks
        .clusters
        .get_mut(&req.name)
        .ok_or_else(|| cluster_not_found(&req.name))?;
    if !cluster.life.observe() {
        world.eks.clusters.remove(&req.name);
        world.tags.forget(&req.name);
        return Err(cluster_not_found(&req.name));
    }
    Ok(json!({ "Cluster": render_cluster(world, &req.name) }))
}

fn delete_cluster(world: &mut World, req: ClusterNameRequest) -> SimResult<Value> {
    let reads = world.reads();
    if world.eks.node_groups.keys().any(|(c, _)| *c == req.name) {
        return Err(SimError::api(
            "ResourceInUseException",
            format!("Cluster has nodegroups attached: {}", req.name),
        ));
    }
    let cluster = world
        .eks
        .clusters
        .get_mut(&req.name)
        .ok_or_else(|| cluster_not_found(&req.name))?;
    if !cluster.life.is("DELETING") {
        cluster.life.go("DELETING", None, reads);
    }
    Ok(json!({ "Cluster": render_cluster(world, &req.name) }))
}

// ---------------------------------------------------------------------------
// Node groups

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RemoteAccessInput {
    ec2_ssh_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateNodeGroupRequest {
    cluster_name: String,
    nodegroup_name: String,
    node_role: String,
    #[serde(default)]
    subnets: Vec<String>,
    #[serde(default)]
    instance_types: Vec<String>,
    #[serde(default)]
    ami_type: Option<String>,
    #[serde(default)]
    disk_size: Option<u32>,
    scaling_config: Scaling,
    #[serde(default)]
    remote_access: Option<RemoteAccessInput>,
    #[serde(default)]
    tags: Vec<TagInput>,
}

fn check_scaling(min: u32, max: u32, desired: u32) -> SimResult<()> {
    if max == 0 {
        return Err(invalid("maxSize must be at least 1"));
    }
    if min > desired || desired > max {
        return Err(invalid(format!(
            "scaling config must satisfy minSize <= desiredSize <= maxSize, got {}/{}/{}",
            min, desired, max
        )));
    }
    Ok(())
}

fn create_node_group(world: &mut World, req: CreateNodeGroupRequest) -> SimResult<Value> {
    let cluster = world
        .eks
        .clusters
        .get(&req.cluster_name)
        .ok_or_else(|| cluster_not_found(&req.cluster_name))?;
    if !cluster.life.is("ACTIVE") {
        return Err(SimError::api(
            "InvalidRequestException",
            format!("Cluster '{}' is not in ACTIVE status", req.cluster_name),
        ));
    }
    if req.nodegroup_name.is_empty() {
        return Err(invalid("nodegroup name is required"));
    }
    let key = (req.cluster_name.clone(), req.nodegroup_name.clone());
    if world.eks.node_groups.contains_key(&key) {
        return Err(SimError::api(
            "ResourceInUseException",
            format!("NodeGroup already exists with name {}", req.nodegroup_name),
        ));
    }
    if !world.eks.roles.values().any(|arn| *arn == req.node_role) {
        return Err(invalid(format!("role {} does not exist", req.node_role)));
    }
    let min = req.scaling_config.min_size.unwrap_or(1);
    let max = req.scaling_config.max_size.unwrap_or(min.max(1));
    let desired = req.scaling_config.desired_size.unwrap_or(min);
    check_scaling(min, max, desired)?;

    let hex = world.next_hex();
    let arn = world.arn(
        "eks",
        &format!("nodegroup/{}/{}/{}", req.cluster_name, req.nodegroup_name, hex),
    );
    world.tags.register(&arn, "eks:nodegroup", &req.tags);
    world.eks.node_groups.insert(
        key.clone(),
        NodeGroup {
            arn,
            instance_types: if req.instance_types.is_empty() {
                vec!["t3.medium".to_string()]
            } else {
                req.instance_types
            },
            ami_type: req.ami_type.unwrap_or_else(|| "AL2_x86_64".to_string()),
            disk_size: req.disk_size.unwrap_or(20),
            node_role: req.node_role,
            subnets: req.subnets,
            min,
            max,
            desired,
            ssh_key: req.remote_access.and_then(|r| r.ec2_ssh_key),
            asg: format!("eks-{}-{}", req.nodegroup_name, &hex[hex.len() - 8..]),
            instances: Vec::new(),
            created: now(),
            life: Lifecycle::moving("CREATING", Some("ACTIVE"), world.config.settle_reads),
        },
    );
    Ok(json!({ "Nodegroup": render_node_group(world, &key) }))
}

fn render_node_group(world: &World, key: &(String, String)) -> Value {
    let Some(g) = world.eks.node_groups.get(key) else {
        return Value::Null;
    };
    json!({
        "NodegroupName": key.1,
        "ClusterName": key.0,
        "NodegroupArn": g.arn,
        "Status": g.life.state,
        "InstanceTypes": g.instance_types,
        "AmiType": g.ami_type,
        "DiskSize": g.disk_size,
        "NodeRole": g.node_role,
        "Subnets": g.subnets,
        "ScalingConfig": {
            "MinSize": g.min,
            "MaxSize": g.max,
            "DesiredSize": g.desired,
        },
        "RemoteAccess": g.ssh_key.as_ref().map(|k| json!({ "Ec2SshKey": k })),
        "Resources": { "AutoScalingGroups": [{ "Name": g.asg }] },
        "CreatedAt": g.created,
        "Tags": world.tags.render(&g.arn),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeGroupNameRequest {
    cluster_name: String,
    nodegroup_name: String,
}

impl NodeGroupNameRequest {
    fn key(&self) -> (String, String) {
        (self.cluster_name.clone(), self.nodegroup_name.clone())
    }
}

fn describe_node_group(world: &mut World, req: NodeGroupNameRequest) -> SimResult<Value> {
    let key = req.key();
    let group = world
        .eks
        .node_groups
        .get_mut(&key)
        .ok_or_else(|| node_group_not_found(&req.nodegroup_name))?;
    if !group.life.observe() {
        let arn = group.arn.clone();
        world.eks.node_groups.remove(&key);
        world.tags.forget(&arn);
        return Err(node_group_not_found(&req.nodegroup_name));
    }
    if group.life.is("ACTIVE") {
        let desired = group.desired as usize;
        group.instances.truncate(desired);
        while group.instances.len() < desired {
            world.seq += 1;
            group
                .instances
                .push(format!("i-{:017x}", 0x0e0e_0000_0000u64 + world.seq));
        }
    }
    Ok(json!({ "Nodegroup": render_node_group(world, &key) }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListNodeGroupsRequest {
    cluster_name: String,
}

fn list_node_groups(world: &mut World, req: ListNodeGroupsRequest) -> SimResult<Value> {
    if !world.eks.clusters.contains_key(&req.cluster_name) {
        return Err(cluster_not_found(&req.cluster_name));
    }
    let names: Vec<&String> = world
        .eks
        .node_groups
        .keys()
        .filter(|(c, _)| *c == req.cluster_name)
        .map(|(_, n)| n)
        .collect();
    Ok(json!({ "Nodegroups": names }))
}

fn delete_node_group(world: &mut World, req: NodeGroupNameRequest) -> SimResult<Value> {
    let reads = world.reads();
    let key = req.key();
    let group = world
        .eks
        .node_groups
        .get_mut(&key)
        .ok_or_else(|| node_group_not_found(&req.nodegroup_name))?;
    if !group.life.is("DELETING") {
        group.life.go("DELETING", None, reads);
    }
    Ok(json!({ "Nodegroup": render_node_group(world, &key) }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateNodeGroupRequest {
    cluster_name: String,
    nodegroup_name: String,
    scaling_config: Scaling,
}

fn update_node_group(world: &mut World, req: UpdateNodeGroupRequest) -> SimResult<Value> {
    let reads = world.reads();
    let key = (req.cluster_name.clone(), req.nodegroup_name.clone());
    let update_id = world.next_hex();
    let group = world
        .eks
        .node_groups
        .get_mut(&key)
        .ok_or_else(|| node_group_not_found(&req.nodegroup_name))?;
    if !group.life.is("ACTIVE") {
        return Err(SimError::api(
            "ResourceInUseException",
            format!(
                "Nodegroup {} is {} and cannot be updated",
                req.nodegroup_name, group.life.state
            ),
        ));
    }
    let min = req.scaling_config.min_size.unwrap_or(group.min);
    let max = req.scaling_config.max_size.unwrap_or(group.max);
    let desired = req.scaling_config.desired_size.unwrap_or(group.desired);
    check_scaling(min, max, desired)?;
    group.min = min;
    group.max = max;
    group.desired = desired;
    group.life.go("UPDATING", Some("ACTIVE"), reads);
    Ok(json!({
        "Update": { "Id": update_id, "Status": "InProgress", "Type": "ConfigUpdate" }
    }))
}

// ---------------------------------------------------------------------------
// Auto scaling

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeGroupsRequest {
    auto_scaling_group_names: Vec<String>,
}

fn describe_groups(world: &mut World, req: DescribeGroupsRequest) -> SimResult<Value> {
    let zones = world
        .regions
        .get(&world.config.region)
        .cloned()
        .unwrap_or_default();
    let groups: Vec<Value> = world
        .eks
        .node_groups
        .values()
        .filter(|g| {
            req.auto_scaling_group_names.is_empty() || req.auto_scaling_group_names.contains(&g.asg)
        })
        .map(|g| {
            let instances: Vec<Value> = g
                .instances
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    json!({
                        "InstanceId": id,
                        "LifecycleState": "InService",
                        "HealthStatus": "Healthy",
                        "AvailabilityZone": zones.get(i % zones.len().max(1)),
                    })
                })
                .collect();
            json!({
                "AutoScalingGroupName": g.asg,
                "MinSize": g.min,
                "MaxSize": g.max,
                "DesiredCapacity": g.desired,
                "Instances": instances,
            })
        })
        .collect();
    Ok(json!({ "AutoScalingGroups": groups }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimConfig;

    fn world() -> World {
        World::new(SimConfig {
            settle_reads: 0,
            ..Default::default()
        })
    }

    fn role_arn(w: &World, name: &str) -> String {
        w.eks.roles[name].clone()
    }

    fn active_cluster(w: &mut World, name: &str) {
        let role = role_arn(w, DEFAULT_ROLES[0]);
        handle(
            w,
            "eks",
            "CreateCluster",
            json!({
                "Name": name,
                "RoleArn": role,
                "ResourcesVpcConfig": { "SubnetIds": ["subnet-1", "subnet-2"] },
            }),
        )
        .unwrap();
        let out = handle(w, "eks", "DescribeCluster", json!({ "Name": name })).unwrap();
        assert_eq!(out["Cluster"]["Status"], "ACTIVE");
    }

    #[test]
    fn test_unknown_role() {
        let mut w = world();
        let err = handle(&mut w, "iam", "GetRole", json!({ "RoleName": "nope" })).unwrap_err();
        assert_eq!(err.code(), "NoSuchEntity");
    }

    #[test]
    fn test_cluster_with_node_groups_cannot_be_deleted() {
        let mut w = world();
        active_cluster(&mut w, "prod");
        let node_role = role_arn(&w, DEFAULT_ROLES[1]);
        handle(
            &mut w,
            "eks",
            "CreateNodegroup",
            json!({
                "ClusterName": "prod",
                "NodegroupName": "general",
                "NodeRole": node_role,
                "ScalingConfig": { "MinSize": 1, "MaxSize": 3, "DesiredSize": 2 },
            }),
        )
        .unwrap();

        let err = handle(&mut w, "eks", "DeleteCluster", json!({ "Name": "prod" })).unwrap_err();
        assert_eq!(err.code(), "ResourceInUseException");
    }

    #[test]
    fn test_active_node_group_fills_its_scaling_group() {
        let mut w = world();
        active_cluster(&mut w, "prod");
        let node_role = role_arn(&w, DEFAULT_ROLES[1]);
        handle(
            &mut w,
            "eks",
            "CreateNodegroup",
            json!({
                "ClusterName": "prod",
                "NodegroupName": "general",
                "NodeRole": node_role,
                "ScalingConfig": { "MinSize": 1, "MaxSize": 3, "DesiredSize": 2 },
            }),
        )
        .unwrap();
        let out = handle(
            &mut w,
            "eks",
            "DescribeNodegroup",
            json!({ "ClusterName": "prod", "NodegroupName": "general" }),
        )
        .unwrap();
        assert_eq!(out["Nodegroup"]["Status"], "ACTIVE");
        let asg = out["Nodegroup"]["Resources"]["AutoScalingGroups"][0]["Name"].clone();

        let groups = handle(
            &mut w,
            "autoscaling",
            "DescribeAutoScalingGroups",
            json!({ "AutoScalingGroupNames": [asg] }),
        )
        .unwrap();
        assert_eq!(
            groups["AutoScalingGroups"][0]["Instances"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_bad_scaling_is_rejected() {
        assert!(check_scaling(1, 3, 2).is_ok());
        assert!(check_scaling(2, 3, 1).is_err());
        assert!(check_scaling(0, 0, 0).is_err());
    }
}
