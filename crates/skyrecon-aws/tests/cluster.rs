mod common;

use common::harness;
use skyrecon_core::model::*;
use skyrecon_core::{
    CloudDriver, ClusterStatus, Iid, NodeGroupStatus, ReconError, ResourceKind,
};
use skyrecon_sim::{DEFAULT_ROLES, Fault};

fn node_group(name: &str, desired: u32) -> NodeGroupRequest {
    NodeGroupRequest {
        name: name.to_string(),
        image: "AL2_x86_64".to_string(),
        vm_spec: "m5.large".to_string(),
        root_disk_size: Some(40),
        key_pair: None,
        desired_size: desired,
        min_size: 1,
        max_size: 4,
    }
}

fn cluster(name: &str, groups: Vec<NodeGroupRequest>) -> ClusterRequest {
    ClusterRequest {
        name: name.to_string(),
        version: "1.29".to_string(),
        network: ClusterNetwork {
            vpc_id: "vpc-1".to_string(),
            subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
            security_group_ids: vec![],
        },
        node_groups: groups,
        tags: vec![KeyValue::new("env", "test")],
    }
}

#[tokio::test]
async fn test_cluster_lifecycle() {
    let h = harness();
    let clusters = h.driver.clusters();

    let info = clusters
        .create(cluster("demo", vec![node_group("workers", 2)]))
        .await
        .unwrap();
    assert_eq!(info.iid, Iid::new("demo", "demo"));
    assert_eq!(info.status, ClusterStatus::Active);
    assert_eq!(info.version, "1.29");
    assert_eq!(info.network.subnet_ids.len(), 2);
    assert_eq!(info.node_groups.len(), 1);

    let workers = &info.node_groups[0];
    assert_eq!(workers.iid.name, "workers");
    assert_eq!(workers.status, NodeGroupStatus::Active);
    assert_eq!(workers.vm_spec, "m5.large");
    assert_eq!(workers.root_disk_size, 40);
    assert_eq!(workers.nodes.len(), 2);

    let scaled = clusters
        .scale_node_group(
            &Iid::by_name("demo"),
            &Iid::by_name("workers"),
            NodeGroupScaling {
                desired_size: 3,
                min_size: 1,
                max_size: 4,
            },
        )
        .await
        .unwrap();
    assert_eq!(scaled.desired_size, 3);
    assert_eq!(scaled.nodes.len(), 3);

    let batch = clusters
        .add_node_group(&Iid::by_name("demo"), node_group("batch", 1))
        .await
        .unwrap();
    assert_eq!(batch.nodes.len(), 1);
    assert_eq!(clusters.get(&Iid::by_name("demo")).await.unwrap().node_groups.len(), 2);

    let err = clusters
        .add_node_group(&Iid::by_name("demo"), node_group("batch", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::AlreadyExists { .. }), "{err}");

    assert!(clusters
        .remove_node_group(&Iid::by_name("demo"), &Iid::by_name("batch"))
        .await
        .unwrap());

    // node groups are removed before the control plane
    assert!(clusters.delete(&Iid::by_name("demo")).await.unwrap());
    assert_eq!(h.sim.calls("eks:DeleteNodegroup"), 2);
    assert_eq!(h.sim.calls("eks:DeleteCluster"), 1);
    assert!(clusters.list().await.unwrap().is_empty());
    assert!(clusters.delete(&Iid::by_name("demo")).await.unwrap());
}

#[tokio::test]
async fn test_missing_cluster_role_creates_nothing() {
    let h = harness();
    assert!(h.sim.remove_role(DEFAULT_ROLES[0]));

    let err = h
        .driver
        .clusters()
        .create(cluster("demo", vec![]))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert_eq!(h.sim.calls("eks:CreateCluster"), 0);
}

#[tokio::test]
async fn test_missing_node_role_leaves_control_plane() {
    let h = harness();
    assert!(h.sim.remove_role(DEFAULT_ROLES[1]));

    let err = h
        .driver
        .clusters()
        .create(cluster("demo", vec![node_group("workers", 1)]))
        .await
        .unwrap_err();
    match &err {
        ReconError::PartialFailure {
            composite_id,
            created,
            failed_step,
            rolled_back,
            ..
        } => {
            assert_eq!(composite_id.as_deref(), Some("demo"));
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].kind, ResourceKind::Cluster);
            assert_eq!(failed_step, "node-group:workers");
            assert!(!rolled_back);
        }
        other => panic!("unexpected error: {other}"),
    }

    let left = h.driver.clusters().get(&Iid::by_name("demo")).await.unwrap();
    assert_eq!(left.status, ClusterStatus::Active);
    assert!(left.node_groups.is_empty());
}

#[tokio::test]
async fn test_unreadable_node_group_is_skipped() {
    let h = harness();
    h.driver
        .clusters()
        .create(cluster(
            "demo",
            vec![node_group("workers", 1), node_group("batch", 1)],
        ))
        .await
        .unwrap();

    h.sim.inject(
        Fault::on("eks:DescribeNodegroup")
            .matching("batch")
            .code("AccessDeniedException"),
    );

    let info = h.driver.clusters().get(&Iid::by_name("demo")).await.unwrap();
    assert_eq!(info.node_groups.len(), 1);
    assert_eq!(info.node_groups[0].iid.name, "workers");
    assert_eq!(h.log.failures().len(), 1);
}

#[tokio::test]
async fn test_invalid_scaling_makes_no_call() {
    let h = harness();
    let err = h
        .driver
        .clusters()
        .scale_node_group(
            &Iid::by_name("demo"),
            &Iid::by_name("workers"),
            NodeGroupScaling {
                desired_size: 5,
                min_size: 1,
                max_size: 4,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)), "{err}");

    let err = h
        .driver
        .clusters()
        .create(cluster("demo", vec![node_group("workers", 0)]))
        .await
        .unwrap_err();
    // desired below min is caught before anything is looked up
    assert!(matches!(err, ReconError::Validation(_)), "{err}");
    assert_eq!(h.sim.total_calls(), 0);
}

#[tokio::test]
async fn test_duplicate_cluster_is_rejected() {
    let h = harness();
    h.driver.clusters().create(cluster("demo", vec![])).await.unwrap();
    let err = h
        .driver
        .clusters()
        .create(cluster("demo", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::AlreadyExists { .. }), "{err}");
    assert_eq!(h.sim.calls("eks:CreateCluster"), 1);
}
