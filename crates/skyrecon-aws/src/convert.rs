//! Wire shape to canonical record conversion

use crate::shapes::*;
use crate::status::{
    CLUSTER_STATES, IMAGE_STATES, INSTANCE_STATES, LOAD_BALANCER_STATES, NODEGROUP_STATES,
    disk_status, public_ip_status,
};
use skyrecon_core::iid::tag_value;
use skyrecon_core::model::*;
use skyrecon_core::{Iid, LoadBalancerStatus, NAME_TAG, ReconError, Result, recover_name};

/// Tag carrying the VM an image was captured from
pub const SOURCE_VM_TAG: &str = "SourceVM";
/// Tag carrying a node group's logical name
pub const NODEGROUP_TAG: &str = "nodegroup";

fn required(value: Option<String>, what: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReconError::malformed(format!("{} is missing", what)))
}

pub fn to_key_values(tags: &[Tag]) -> Vec<KeyValue> {
    tags.iter()
        .map(|t| KeyValue::new(&t.key, &t.value))
        .collect()
}

pub fn to_tags(key_values: &[KeyValue]) -> Vec<Tag> {
    key_values
        .iter()
        .map(|kv| Tag {
            key: kv.key.clone(),
            value: kv.value.clone(),
        })
        .collect()
}

/// User tags with the `Name` tag first
pub fn named_tags(name: &str, extra: &[KeyValue]) -> Vec<Tag> {
    let mut tags = vec![Tag {
        key: NAME_TAG.to_string(),
        value: name.to_string(),
    }];
    tags.extend(to_tags(extra).into_iter().filter(|t| t.key != NAME_TAG));
    tags
}

pub fn tag_spec(resource_type: &str, tags: Vec<Tag>) -> Vec<TagSpecification> {
    vec![TagSpecification {
        resource_type: resource_type.to_string(),
        tags,
    }]
}

pub fn volume_to_disk(volume: Volume) -> Result<DiskInfo> {
    let id = required(volume.volume_id, "VolumeId")?;
    let owner = volume
        .attachments
        .first()
        .and_then(|a| a.instance_id.clone());
    let status = disk_status(volume.state.as_deref(), &volume.attachments, owner.as_deref());

    let mut key_values = Vec::new();
    if let Some(encrypted) = volume.encrypted {
        key_values.push(KeyValue::new("Encrypted", encrypted.to_string()));
    }
    if let Some(iops) = volume.iops {
        key_values.push(KeyValue::new("Iops", iops.to_string()));
    }
    if let Some(multi) = volume.multi_attach_enabled {
        key_values.push(KeyValue::new("MultiAttachEnabled", multi.to_string()));
    }

    Ok(DiskInfo {
        iid: Iid::new(recover_name(None, &to_key_values(&volume.tags), &id), id),
        zone: volume.availability_zone.unwrap_or_default(),
        disk_type: volume.volume_type.unwrap_or_default(),
        disk_size: volume.size.unwrap_or_default(),
        status,
        owner_vm: owner.map(Iid::by_id),
        created_at: volume.create_time,
        tags: to_key_values(&volume.tags),
        key_values,
    })
}

pub fn instance_to_vm(instance: Instance) -> Result<VmInfo> {
    let id = required(instance.instance_id, "InstanceId")?;
    let tags = to_key_values(&instance.tags);
    let status = INSTANCE_STATES.normalize(instance.state.as_ref().and_then(|s| s.name.as_deref()));
    let root_device = instance.root_device_name.clone();

    let data_disks = instance
        .block_device_mappings
        .iter()
        .filter(|m| m.device_name.is_some() && m.device_name != root_device)
        .filter_map(|m| m.ebs.as_ref().and_then(|e| e.volume_id.clone()))
        .map(Iid::by_id)
        .collect();

    Ok(VmInfo {
        iid: Iid::new(recover_name(None, &tags, &id), id),
        status,
        zone: instance
            .placement
            .and_then(|p| p.availability_zone)
            .unwrap_or_default(),
        image: instance.image_id.unwrap_or_default(),
        vm_spec: instance.instance_type.unwrap_or_default(),
        key_pair: instance.key_name.map(Iid::by_name),
        security_groups: instance
            .security_groups
            .into_iter()
            .filter_map(|g| {
                g.group_id
                    .map(|id| Iid::new(g.group_name.unwrap_or_default(), id))
            })
            .collect(),
        subnet_id: instance.subnet_id,
        vpc_id: instance.vpc_id,
        public_ip: instance.public_ip_address,
        private_ip: instance.private_ip_address,
        root_device,
        data_disks,
        created_at: instance.launch_time,
        tags,
    })
}

pub fn image_to_info(image: Image) -> Result<ImageInfo> {
    let id = required(image.image_id, "ImageId")?;
    let tags = to_key_values(&image.tags);
    Ok(ImageInfo {
        iid: Iid::new(recover_name(image.name.as_deref(), &tags, &id), id),
        source_vm: tag_value(&tags, SOURCE_VM_TAG).map(Iid::by_id),
        status: IMAGE_STATES.normalize(image.state.as_deref()),
        created_at: image.creation_date,
        tags,
    })
}

pub fn key_pair_to_info(key: KeyPair) -> Result<KeyPairInfo> {
    let name = required(key.key_name, "KeyName")?;
    let id = key.key_pair_id.unwrap_or_else(|| name.clone());
    Ok(KeyPairInfo {
        iid: Iid::new(name, id),
        fingerprint: key.key_fingerprint.unwrap_or_default(),
        public_key: key.public_key,
        private_key: key.key_material,
        created_at: key.create_time,
        tags: to_key_values(&key.tags),
    })
}

fn permission_to_rules(permission: &IpPermission, direction: RuleDirection) -> Vec<SecurityRule> {
    let protocol = match permission.ip_protocol.as_deref() {
        None | Some("-1") => "all".to_string(),
        Some(p) => p.to_lowercase(),
    };
    permission
        .ip_ranges
        .iter()
        .map(|r| SecurityRule {
            direction,
            protocol: protocol.clone(),
            from_port: permission.from_port.unwrap_or(-1),
            to_port: permission.to_port.unwrap_or(-1),
            cidr: r.cidr_ip.clone().unwrap_or_else(|| "0.0.0.0/0".to_string()),
        })
        .collect()
}

/// Split rules into ingress and egress permissions
pub fn rules_to_permissions(rules: &[SecurityRule]) -> (Vec<IpPermission>, Vec<IpPermission>) {
    let to_permission = |r: &SecurityRule| {
        let all = r.protocol.eq_ignore_ascii_case("all") || r.protocol == "-1";
        IpPermission {
            ip_protocol: Some(if all { "-1".to_string() } else { r.protocol.to_lowercase() }),
            from_port: if all { None } else { Some(r.from_port) },
            to_port: if all { None } else { Some(r.to_port) },
            ip_ranges: vec![IpRange {
                cidr_ip: Some(r.cidr.clone()),
            }],
        }
    };
    let ingress = rules
        .iter()
        .filter(|r| r.direction == RuleDirection::Inbound)
        .map(to_permission)
        .collect();
    let egress = rules
        .iter()
        .filter(|r| r.direction == RuleDirection::Outbound)
        .map(to_permission)
        .collect();
    (ingress, egress)
}

pub fn security_group_to_info(group: SecurityGroup) -> Result<SecurityGroupInfo> {
    let id = required(group.group_id, "GroupId")?;
    let tags = to_key_values(&group.tags);
    let mut rules: Vec<SecurityRule> = group
        .ip_permissions
        .iter()
        .flat_map(|p| permission_to_rules(p, RuleDirection::Inbound))
        .collect();
    rules.extend(
        group
            .ip_permissions_egress
            .iter()
            .flat_map(|p| permission_to_rules(p, RuleDirection::Outbound)),
    );

    Ok(SecurityGroupInfo {
        iid: Iid::new(recover_name(group.group_name.as_deref(), &tags, &id), id),
        vpc_id: group.vpc_id.unwrap_or_default(),
        description: group.description.unwrap_or_default(),
        rules,
        tags,
    })
}

pub fn subnet_to_info(subnet: Subnet) -> Result<SubnetInfo> {
    let id = required(subnet.subnet_id, "SubnetId")?;
    let tags = to_key_values(&subnet.tags);
    Ok(SubnetInfo {
        iid: Iid::new(recover_name(None, &tags, &id), id),
        zone: subnet.availability_zone.unwrap_or_default(),
        ipv4_cidr: subnet.cidr_block.unwrap_or_default(),
        tags,
    })
}

pub fn vpc_to_info(
    vpc: Vpc,
    subnets: Vec<SubnetInfo>,
    internet_gateway: Option<String>,
) -> Result<VpcInfo> {
    let id = required(vpc.vpc_id, "VpcId")?;
    let tags = to_key_values(&vpc.tags);
    Ok(VpcInfo {
        iid: Iid::new(recover_name(None, &tags, &id), id),
        ipv4_cidr: vpc.cidr_block.unwrap_or_default(),
        internet_gateway,
        subnets,
        tags,
    })
}

pub fn address_to_info(address: Address) -> Result<PublicIpInfo> {
    let id = required(address.allocation_id, "AllocationId")?;
    let tags = to_key_values(&address.tags);
    Ok(PublicIpInfo {
        iid: Iid::new(recover_name(None, &tags, &id), id),
        public_ip: address.public_ip.unwrap_or_default(),
        status: public_ip_status(
            address.association_id.as_deref(),
            address.instance_id.as_deref(),
        ),
        owner_vm: address.instance_id.map(Iid::by_id),
        private_ip: address.private_ip_address,
        tags,
    })
}

pub fn target_group_to_info(group: &TargetGroup, members: Vec<Iid>) -> Result<TargetGroupInfo> {
    Ok(TargetGroupInfo {
        provider_id: required(group.target_group_arn.clone(), "TargetGroupArn")?,
        protocol: group.protocol.clone().unwrap_or_default(),
        port: group.port.unwrap_or_default(),
        members,
        health_checker: HealthCheckerInfo {
            protocol: group.health_check_protocol.clone().unwrap_or_default(),
            port: group
                .health_check_port
                .clone()
                .unwrap_or_else(|| "traffic-port".to_string()),
            interval_secs: group.health_check_interval_seconds.unwrap_or_default(),
            timeout_secs: group.health_check_timeout_seconds.unwrap_or_default(),
            threshold: group.healthy_threshold_count.unwrap_or_default(),
        },
    })
}

pub fn listener_to_info(listener: &Listener) -> Result<ListenerInfo> {
    Ok(ListenerInfo {
        provider_id: required(listener.listener_arn.clone(), "ListenerArn")?,
        protocol: listener.protocol.clone().unwrap_or_default(),
        port: listener.port.unwrap_or_default(),
    })
}

pub fn load_balancer_to_frontend(lb: &LoadBalancer) -> Result<FrontendInfo> {
    Ok(FrontendInfo {
        provider_id: required(lb.load_balancer_arn.clone(), "LoadBalancerArn")?,
        dns_name: lb.dns_name.clone().unwrap_or_default(),
        scheme: lb.scheme.clone().unwrap_or_default(),
        ip: lb
            .availability_zones
            .iter()
            .flat_map(|z| z.load_balancer_addresses.iter())
            .find_map(|a| a.ip_address.clone()),
    })
}

/// Composite status: the frontend's state, or `Incomplete` without one
pub fn load_balancer_status(frontend: Option<&LoadBalancer>) -> LoadBalancerStatus {
    match frontend {
        None => LoadBalancerStatus::Incomplete,
        Some(lb) => LOAD_BALANCER_STATES
            .normalize(lb.state.as_ref().and_then(|s| s.code.as_deref())),
    }
}

pub fn member_state(state: Option<&str>) -> MemberState {
    match state {
        Some("healthy") => MemberState::Healthy,
        Some("unhealthy") => MemberState::Unhealthy,
        Some("initial") => MemberState::Pending,
        _ => MemberState::Unknown,
    }
}

/// `1.29.3` becomes `1.29`
pub fn normalize_k8s_version(version: &str) -> String {
    let version = version.trim().trim_start_matches('v');
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

pub fn cluster_to_info(cluster: Cluster, node_groups: Vec<NodeGroupInfo>) -> Result<ClusterInfo> {
    let name = required(cluster.name, "Cluster.Name")?;
    let vpc = cluster.resources_vpc_config.unwrap_or_default();
    Ok(ClusterInfo {
        iid: Iid::new(name.clone(), name),
        version: cluster.version.unwrap_or_default(),
        status: CLUSTER_STATES.normalize(cluster.status.as_deref()),
        network: ClusterNetwork {
            vpc_id: vpc.vpc_id.unwrap_or_default(),
            subnet_ids: vpc.subnet_ids,
            security_group_ids: vpc.security_group_ids,
        },
        endpoint: cluster.endpoint,
        node_groups,
        created_at: cluster.created_at,
        tags: to_key_values(&cluster.tags),
    })
}

pub fn nodegroup_to_info(group: Nodegroup, nodes: Vec<Iid>) -> Result<NodeGroupInfo> {
    let id = required(group.nodegroup_name, "NodegroupName")?;
    let tags = to_key_values(&group.tags);
    let scaling = group.scaling_config.unwrap_or_default();
    let name = tag_value(&tags, NODEGROUP_TAG)
        .filter(|n| !n.is_empty())
        .unwrap_or(id.as_str())
        .to_string();

    Ok(NodeGroupInfo {
        iid: Iid::new(name, id),
        status: NODEGROUP_STATES.normalize(group.status.as_deref()),
        image: group.ami_type.unwrap_or_default(),
        vm_spec: group.instance_types.into_iter().next().unwrap_or_default(),
        root_disk_size: group.disk_size.unwrap_or_default(),
        key_pair: group
            .remote_access
            .and_then(|r| r.ec2_ssh_key)
            .map(Iid::by_name),
        desired_size: scaling.desired_size.unwrap_or_default(),
        min_size: scaling.min_size.unwrap_or_default(),
        max_size: scaling.max_size.unwrap_or_default(),
        nodes,
        tags,
    })
}

pub fn region_to_info(region: &str, zones: Vec<AvailabilityZone>) -> RegionZoneInfo {
    RegionZoneInfo {
        name: region.to_string(),
        zones: zones
            .into_iter()
            .filter_map(|z| {
                z.zone_name.map(|name| ZoneInfo {
                    name,
                    available: z.state.as_deref() == Some("available"),
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrecon_core::{DiskStatus, PublicIpStatus, VmStatus};

    #[test]
    fn test_volume_conversion() {
        let volume = Volume {
            volume_id: Some("vol-1".into()),
            size: Some(20),
            volume_type: Some("gp3".into()),
            state: Some("in-use".into()),
            availability_zone: Some("us-east-1a".into()),
            encrypted: Some(true),
            attachments: vec![VolumeAttachment {
                instance_id: Some("i-1".into()),
                state: Some("attached".into()),
                ..Default::default()
            }],
            tags: vec![Tag {
                key: "Name".into(),
                value: "data".into(),
            }],
            ..Default::default()
        };

        let disk = volume_to_disk(volume).unwrap();
        assert_eq!(disk.iid, Iid::new("data", "vol-1"));
        assert_eq!(disk.status, DiskStatus::Attached);
        assert_eq!(disk.owner_vm, Some(Iid::by_id("i-1")));
        assert_eq!(disk.disk_size, 20);
        assert!(disk.key_values.contains(&KeyValue::new("Encrypted", "true")));
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let err = volume_to_disk(Volume::default()).unwrap_err();
        assert!(matches!(err, ReconError::MalformedResponse(_)));
    }

    #[test]
    fn test_sparse_instance() {
        let vm = instance_to_vm(Instance {
            instance_id: Some("i-1".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(vm.iid, Iid::new("i-1", "i-1"));
        assert_eq!(vm.status, VmStatus::Error);
        assert!(vm.public_ip.is_none());
        assert!(vm.data_disks.is_empty());
    }

    #[test]
    fn test_instance_data_disks_skip_root() {
        let vm = instance_to_vm(Instance {
            instance_id: Some("i-1".into()),
            state: Some(InstanceState {
                name: Some("running".into()),
                code: Some(16),
            }),
            root_device_name: Some("/dev/sda1".into()),
            block_device_mappings: vec![
                InstanceBlockDeviceMapping {
                    device_name: Some("/dev/sda1".into()),
                    ebs: Some(EbsInstanceBlockDevice {
                        volume_id: Some("vol-root".into()),
                    }),
                },
                InstanceBlockDeviceMapping {
                    device_name: Some("/dev/sdf".into()),
                    ebs: Some(EbsInstanceBlockDevice {
                        volume_id: Some("vol-data".into()),
                    }),
                },
            ],
            ..Default::default()
        })
        .unwrap();

        assert_eq!(vm.status, VmStatus::Running);
        assert_eq!(vm.data_disks, vec![Iid::by_id("vol-data")]);
    }

    #[test]
    fn test_security_rules_roundtrip_shape() {
        let rules = vec![
            SecurityRule {
                direction: RuleDirection::Inbound,
                protocol: "TCP".into(),
                from_port: 22,
                to_port: 22,
                cidr: "10.0.0.0/8".into(),
            },
            SecurityRule {
                direction: RuleDirection::Outbound,
                protocol: "all".into(),
                from_port: -1,
                to_port: -1,
                cidr: "0.0.0.0/0".into(),
            },
        ];

        let (ingress, egress) = rules_to_permissions(&rules);
        assert_eq!(ingress[0].ip_protocol.as_deref(), Some("tcp"));
        assert_eq!(egress[0].ip_protocol.as_deref(), Some("-1"));
        assert_eq!(egress[0].from_port, None);

        let info = security_group_to_info(SecurityGroup {
            group_id: Some("sg-1".into()),
            group_name: Some("web".into()),
            ip_permissions: ingress,
            ip_permissions_egress: egress,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(info.iid, Iid::new("web", "sg-1"));
        assert_eq!(info.rules[0].protocol, "tcp");
        assert_eq!(info.rules[1].protocol, "all");
        assert_eq!(info.rules[1].from_port, -1);
    }

    #[test]
    fn test_address_owner() {
        let info = address_to_info(Address {
            allocation_id: Some("eipalloc-1".into()),
            public_ip: Some("203.0.113.10".into()),
            instance_id: Some("i-1".into()),
            association_id: Some("eipassoc-1".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(info.status, PublicIpStatus::Associated);
        assert_eq!(info.owner_vm, Some(Iid::by_id("i-1")));
    }

    #[test]
    fn test_named_tags_puts_name_first() {
        let tags = named_tags("data", &[KeyValue::new("Name", "other"), KeyValue::new("env", "dev")]);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].value, "data");
        assert_eq!(tags[1].key, "env");
    }

    #[test]
    fn test_k8s_version() {
        assert_eq!(normalize_k8s_version("1.29.3"), "1.29");
        assert_eq!(normalize_k8s_version("1.30"), "1.30");
        assert_eq!(normalize_k8s_version("v1.28.1"), "1.28");
    }

    #[test]
    fn test_nodegroup_name_from_tag() {
        let info = nodegroup_to_info(
            Nodegroup {
                nodegroup_name: Some("ng-abc".into()),
                status: Some("ACTIVE".into()),
                tags: vec![Tag {
                    key: NODEGROUP_TAG.into(),
                    value: "workers".into(),
                }],
                ..Default::default()
            },
            vec![],
        )
        .unwrap();
        assert_eq!(info.iid, Iid::new("workers", "ng-abc"));
    }

    #[test]
    fn test_incomplete_load_balancer() {
        assert_eq!(load_balancer_status(None), LoadBalancerStatus::Incomplete);
    }
}
