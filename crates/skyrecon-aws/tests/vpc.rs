mod common;

use common::{harness, harness_with, settings};
use skyrecon_aws::AwsSettings;
use skyrecon_core::model::*;
use skyrecon_core::{CloudDriver, CompositePolicy, Iid, ReconError, ResourceKind};

fn subnet(name: &str, cidr: &str) -> SubnetRequest {
    SubnetRequest {
        name: name.to_string(),
        ipv4_cidr: cidr.to_string(),
        ..Default::default()
    }
}

fn network(name: &str, subnets: Vec<SubnetRequest>) -> VpcRequest {
    VpcRequest {
        name: name.to_string(),
        ipv4_cidr: "10.0.0.0/16".to_string(),
        subnets,
        tags: vec![KeyValue::new("team", "net")],
    }
}

#[tokio::test]
async fn test_vpc_lifecycle() {
    let h = harness();
    let vpcs = h.driver.vpcs();

    let vpc = vpcs
        .create(network(
            "main",
            vec![subnet("web", "10.0.1.0/24"), subnet("db", "10.0.2.0/24")],
        ))
        .await
        .unwrap();
    assert_eq!(vpc.iid.name, "main");
    assert!(vpc.iid.provider_id.starts_with("vpc-"));
    assert_eq!(vpc.ipv4_cidr, "10.0.0.0/16");
    assert!(vpc.internet_gateway.as_deref().unwrap_or("").starts_with("igw-"));
    let names: Vec<&str> = vpc.subnets.iter().map(|s| s.iid.name.as_str()).collect();
    assert_eq!(names, vec!["db", "web"]);
    assert!(vpc.subnets.iter().all(|s| s.zone == "us-east-1a"));
    assert!(vpc.tags.contains(&KeyValue::new("team", "net")));

    // steps ran in order: network, gateway, route, subnets
    assert_eq!(h.sim.calls("ec2:CreateVpc"), 1);
    assert_eq!(h.sim.calls("ec2:AttachInternetGateway"), 1);
    assert_eq!(h.sim.calls("ec2:CreateRoute"), 1);
    assert_eq!(h.sim.calls("ec2:CreateSubnet"), 2);

    let by_name = vpcs.get(&Iid::by_name("main")).await.unwrap();
    assert_eq!(by_name, vpc);
    let by_id = vpcs.get(&Iid::by_id(&vpc.iid.provider_id)).await.unwrap();
    assert_eq!(by_id.iid.provider_id, vpc.iid.provider_id);

    let subnets = vpcs.list_subnets(&Iid::by_name("main")).await.unwrap();
    assert_eq!(subnets.len(), 2);
    assert_eq!(subnets[1].ipv4_cidr, "10.0.1.0/24");

    assert!(vpcs.delete(&Iid::by_name("main")).await.unwrap());
    let err = vpcs.get(&Iid::by_name("main")).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn test_delete_runs_in_dependency_order() {
    let h = harness();
    let vpcs = h.driver.vpcs();
    let vpc = vpcs
        .create(network(
            "main",
            vec![subnet("web", "10.0.1.0/24"), subnet("db", "10.0.2.0/24")],
        ))
        .await
        .unwrap();
    h.sim.reset_calls();

    // the network only goes once subnets and gateway are gone,
    // which the provider enforces with DependencyViolation
    assert!(vpcs.delete(&Iid::by_id(&vpc.iid.provider_id)).await.unwrap());
    assert_eq!(h.sim.calls("ec2:DeleteSubnet"), 2);
    assert_eq!(h.sim.calls("ec2:DeleteRoute"), 1);
    assert_eq!(h.sim.calls("ec2:DetachInternetGateway"), 1);
    assert_eq!(h.sim.calls("ec2:DeleteInternetGateway"), 1);
    assert_eq!(h.sim.calls("ec2:DeleteVpc"), 1);

    // already gone
    assert!(vpcs.delete(&Iid::by_name("main")).await.unwrap());
    assert!(vpcs.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_and_remove_subnet() {
    let h = harness();
    let vpcs = h.driver.vpcs();
    vpcs.create(network("main", vec![subnet("web", "10.0.1.0/24")]))
        .await
        .unwrap();

    let vpc = vpcs
        .add_subnet(
            &Iid::by_name("main"),
            SubnetRequest {
                zone: Some("us-east-1b".to_string()),
                ..subnet("batch", "10.0.3.0/24")
            },
        )
        .await
        .unwrap();
    assert_eq!(vpc.subnets.len(), 2);
    let batch = vpc.subnets.iter().find(|s| s.iid.name == "batch").unwrap();
    assert_eq!(batch.zone, "us-east-1b");

    let err = vpcs
        .add_subnet(&Iid::by_name("main"), subnet("batch", "10.0.4.0/24"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconError::AlreadyExists {
            kind: ResourceKind::Subnet,
            ..
        }
    ));

    assert!(
        vpcs.remove_subnet(&Iid::by_name("main"), &Iid::by_name("batch"))
            .await
            .unwrap()
    );
    let subnets = vpcs.list_subnets(&Iid::by_name("main")).await.unwrap();
    assert_eq!(subnets.len(), 1);
    assert_eq!(subnets[0].iid.name, "web");

    // removing again is not an error
    assert!(
        vpcs.remove_subnet(&Iid::by_name("main"), &Iid::by_name("batch"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_subnet_of_other_vpc_is_not_removed() {
    let h = harness();
    let vpcs = h.driver.vpcs();
    vpcs.create(network("one", vec![])).await.unwrap();
    let two = vpcs
        .create(network("two", vec![subnet("web", "10.0.1.0/24")]))
        .await
        .unwrap();
    let foreign = Iid::by_id(&two.subnets[0].iid.provider_id);

    let err = vpcs
        .remove_subnet(&Iid::by_name("one"), &foreign)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert_eq!(h.sim.calls("ec2:DeleteSubnet"), 0);
    assert_eq!(vpcs.list_subnets(&Iid::by_name("two")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_request_makes_no_provider_call() {
    let h = harness();
    let vpcs = h.driver.vpcs();

    for req in [
        VpcRequest {
            ipv4_cidr: "10.0.0.0/8".to_string(),
            ..network("main", vec![])
        },
        network("main", vec![subnet("web", "10.0.1.0/33")]),
        network(
            "main",
            vec![subnet("web", "10.0.1.0/24"), subnet("web", "10.0.2.0/24")],
        ),
        network("", vec![]),
    ] {
        let err = vpcs.create(req).await.unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)), "{err}");
    }
    assert_eq!(h.sim.total_calls(), 0);
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    let h = harness();
    let vpcs = h.driver.vpcs();
    vpcs.create(network("main", vec![])).await.unwrap();

    let err = vpcs.create(network("main", vec![])).await.unwrap_err();
    assert!(matches!(
        err,
        ReconError::AlreadyExists {
            kind: ResourceKind::Vpc,
            ..
        }
    ));
    assert_eq!(h.sim.calls("ec2:CreateVpc"), 1);
}

#[tokio::test]
async fn test_failed_subnet_leaves_partial_network() {
    let h = harness();
    let vpcs = h.driver.vpcs();

    let err = vpcs
        .create(network(
            "main",
            vec![subnet("web", "10.0.1.0/24"), subnet("far", "192.168.0.0/24")],
        ))
        .await
        .unwrap_err();
    let vpc_id = match &err {
        ReconError::PartialFailure {
            kind,
            composite_id,
            created,
            failed_step,
            rolled_back,
            source,
        } => {
            assert_eq!(*kind, ResourceKind::Vpc);
            assert_eq!(failed_step, "subnet:far");
            assert!(!rolled_back);
            assert!(matches!(**source, ReconError::Validation(_)));
            let kinds: Vec<ResourceKind> = created.iter().map(|c| c.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    ResourceKind::Vpc,
                    ResourceKind::InternetGateway,
                    ResourceKind::Subnet
                ]
            );
            assert_eq!(composite_id.as_deref(), Some(created[0].provider_id.as_str()));
            created[0].provider_id.clone()
        }
        other => panic!("unexpected error: {other}"),
    };

    // the leftover is visible and can be deleted as a whole
    let vpc = vpcs.get(&Iid::by_id(&vpc_id)).await.unwrap();
    assert_eq!(vpc.subnets.len(), 1);
    assert!(vpc.internet_gateway.is_some());
    assert!(vpcs.delete(&Iid::by_id(&vpc_id)).await.unwrap());
    assert!(vpcs.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_compensation_removes_created_parts() {
    let h = harness_with(AwsSettings {
        composite: CompositePolicy::Compensate,
        ..settings()
    });
    let vpcs = h.driver.vpcs();

    let err = vpcs
        .create(network(
            "main",
            vec![subnet("web", "10.0.1.0/24"), subnet("far", "192.168.0.0/24")],
        ))
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
            assert_eq!(failed_step, "subnet:far");
            assert!(rolled_back);
            assert!(created.is_empty());
            assert!(composite_id.is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.sim.calls("ec2:DeleteSubnet"), 1);
    assert_eq!(h.sim.calls("ec2:DeleteRoute"), 1);
    assert_eq!(h.sim.calls("ec2:DeleteInternetGateway"), 1);
    assert_eq!(h.sim.calls("ec2:DeleteVpc"), 1);

    let err = vpcs.get(&Iid::by_name("main")).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn test_list_returns_every_network() {
    let h = harness();
    let vpcs = h.driver.vpcs();
    vpcs.create(network("one", vec![subnet("a", "10.0.1.0/24")]))
        .await
        .unwrap();
    vpcs.create(network("two", vec![])).await.unwrap();

    let mut names: Vec<String> = vpcs
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.iid.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["one", "two"]);
}
