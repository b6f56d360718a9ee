mod common;

use common::{harness, harness_with, running_vm, settings};
use skyrecon_aws::AwsSettings;
use skyrecon_core::model::*;
use skyrecon_core::{
    CloudDriver, CompositePolicy, Iid, LoadBalancerStatus, ReconError, ResourceKind,
};
use skyrecon_sim::Fault;

fn nlb(name: &str, listener_port: &str, members: Vec<Iid>) -> LoadBalancerRequest {
    LoadBalancerRequest {
        name: name.to_string(),
        vpc_id: "vpc-1".to_string(),
        subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
        scheme: None,
        listener: ListenerRequest {
            protocol: "tcp".to_string(),
            port: listener_port.to_string(),
        },
        target_group: TargetGroupRequest {
            protocol: "TCP".to_string(),
            port: "8080".to_string(),
            members,
        },
        health_checker: None,
        tags: vec![KeyValue::new("team", "edge")],
    }
}

#[tokio::test]
async fn test_load_balancer_lifecycle() {
    let h = harness();
    let vm = running_vm(&h, "web-1").await;
    let lbs = h.driver.load_balancers();

    let lb = lbs
        .create(nlb("web", "80", vec![Iid::by_name("web-1")]))
        .await
        .unwrap();
    assert_eq!(lb.iid.name, "web");
    assert!(lb.iid.provider_id.contains(":targetgroup/web/"));
    assert_eq!(lb.status, LoadBalancerStatus::Active);
    assert_eq!(lb.target_group.port, 8080);
    assert_eq!(lb.target_group.members, vec![Iid::by_id(&vm.iid.provider_id)]);
    assert_eq!(lb.target_group.health_checker.protocol, "TCP");
    assert_eq!(lb.listener.as_ref().map(|l| l.port), Some(80));
    let frontend = lb.frontend.expect("frontend");
    assert_eq!(frontend.scheme, "internet-facing");
    assert!(!frontend.dns_name.is_empty());

    let health = lbs.member_health(&Iid::by_name("web")).await.unwrap();
    assert_eq!(health.len(), 1);
    assert_eq!(health[0].state, MemberState::Healthy);

    let listener = lbs
        .change_listener(
            &Iid::by_name("web"),
            ListenerRequest {
                protocol: "TCP".to_string(),
                port: "8443".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(listener.port, 8443);

    let checker = lbs
        .change_health_checker(
            &Iid::by_name("web"),
            HealthCheckerRequest {
                threshold: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(checker.threshold, 5);
    assert_eq!(checker.interval_secs, 30);

    assert!(lbs
        .remove_members(&Iid::by_name("web"), &[Iid::by_name("web-1")])
        .await
        .unwrap());
    assert!(lbs.member_health(&lb.iid).await.unwrap().is_empty());

    assert!(lbs.delete(&Iid::by_name("web")).await.unwrap());
    let err = lbs.get(&Iid::by_name("web")).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(lbs.delete(&Iid::by_name("web")).await.unwrap());
    assert_eq!(h.sim.calls("elbv2:DeleteLoadBalancer"), 1);
    assert_eq!(h.sim.calls("elbv2:DeleteTargetGroup"), 1);
}

#[tokio::test]
async fn test_listener_failure_leaves_target_group() {
    let h = harness();
    let lbs = h.driver.load_balancers();

    let err = lbs.create(nlb("web", "eighty", vec![])).await.unwrap_err();
    let tg_arn = match &err {
        ReconError::PartialFailure {
            kind,
            composite_id,
            created,
            failed_step,
            rolled_back,
            source,
        } => {
            assert_eq!(*kind, ResourceKind::LoadBalancer);
            assert_eq!(failed_step, "listener");
            assert!(!rolled_back);
            assert!(matches!(**source, ReconError::Validation(_)));
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].kind, ResourceKind::TargetGroup);
            assert_eq!(composite_id.as_deref(), Some(created[0].provider_id.as_str()));
            created[0].provider_id.clone()
        }
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(err.partial_ids(), vec![tg_arn.as_str()]);
    assert_eq!(h.sim.calls("elbv2:CreateListener"), 0);

    // the leftover is visible and reported incomplete
    let lb = lbs.get(&Iid::by_name("web")).await.unwrap();
    assert_eq!(lb.iid.provider_id, tg_arn);
    assert_eq!(lb.status, LoadBalancerStatus::Incomplete);
    assert!(lb.listener.is_none());
    assert!(lb.frontend.is_none());

    // and a second create with the same name is refused
    let err = lbs.create(nlb("web", "80", vec![])).await.unwrap_err();
    assert!(matches!(err, ReconError::AlreadyExists { .. }), "{err}");

    assert!(lbs.delete(&Iid::by_name("web")).await.unwrap());
    assert!(lbs.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_compensation_removes_created_parts() {
    let h = harness_with(AwsSettings {
        composite: CompositePolicy::Compensate,
        ..settings()
    });
    h.sim.inject(
        Fault::on("elbv2:CreateLoadBalancer")
            .code("TooManyLoadBalancers")
            .times(1),
    );

    let err = h
        .driver
        .load_balancers()
        .create(nlb("web", "80", vec![]))
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
            assert_eq!(failed_step, "frontend");
            assert!(rolled_back);
            assert!(created.is_empty());
            assert!(composite_id.is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.sim.calls("elbv2:DeleteListener"), 1);
    assert_eq!(h.sim.calls("elbv2:DeleteTargetGroup"), 1);

    let err = h
        .driver
        .load_balancers()
        .get(&Iid::by_name("web"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn test_bad_target_group_protocol_creates_nothing() {
    let h = harness();
    let mut req = nlb("web", "80", vec![]);
    req.target_group.protocol = "HTTP".to_string();

    let err = h.driver.load_balancers().create(req).await.unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)), "{err}");
    assert_eq!(h.sim.calls("elbv2:CreateTargetGroup"), 0);
}

#[tokio::test]
async fn test_bad_scheme_is_rejected_before_any_call() {
    let h = harness();
    let mut req = nlb("web", "80", vec![]);
    req.scheme = Some("public".to_string());

    let err = h.driver.load_balancers().create(req).await.unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)), "{err}");
    assert!(err.to_string().contains("public"), "{err}");
    assert_eq!(h.sim.total_calls(), 0);
    assert_eq!(h.sim.calls("elbv2:CreateTargetGroup"), 0);
    assert_eq!(h.sim.calls("elbv2:CreateListener"), 0);
}

#[tokio::test]
async fn test_list_skips_load_balancer_that_fails() {
    let h = harness();
    let lbs = h.driver.load_balancers();
    lbs.create(nlb("alpha", "80", vec![])).await.unwrap();
    let beta = lbs.create(nlb("beta", "81", vec![])).await.unwrap();

    h.sim.inject(
        Fault::on("elbv2:DescribeTargetHealth")
            .matching(&beta.iid.provider_id)
            .code("AccessDenied"),
    );

    let listed = lbs.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].iid.name, "alpha");
    assert_eq!(h.log.failures().len(), 1);
    assert_eq!(h.log.failures()[0].operation, "elbv2:DescribeTargetHealth");
}

#[tokio::test]
async fn test_internal_scheme_and_member_added_later() {
    let h = harness();
    let mut req = nlb("private", "80", vec![]);
    req.scheme = Some("internal".to_string());
    let lb = h.driver.load_balancers().create(req).await.unwrap();
    assert_eq!(lb.frontend.map(|f| f.scheme), Some("internal".to_string()));
    assert!(lb.target_group.members.is_empty());

    running_vm(&h, "worker").await;
    let grown = h
        .driver
        .load_balancers()
        .add_members(&Iid::by_name("private"), &[Iid::by_name("worker")])
        .await
        .unwrap();
    assert_eq!(grown.target_group.members.len(), 1);
}
