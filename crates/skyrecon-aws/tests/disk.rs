mod common;

use common::{harness, running_vm};
use serde_json::json;
use skyrecon_core::model::{DiskRequest, KeyValue};
use skyrecon_core::{CloudDriver, DiskStatus, Iid, ReconError, ResourceKind};
use skyrecon_sim::Fault;

fn data_disk(name: &str, size: &str) -> DiskRequest {
    DiskRequest {
        name: name.to_string(),
        disk_size: size.to_string(),
        tags: vec![KeyValue::new("team", "storage")],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_disk_lifecycle() {
    let h = harness();
    let vm = running_vm(&h, "app").await;
    let disks = h.driver.disks();

    let disk = disks.create(data_disk("data", "20")).await.unwrap();
    assert_eq!(disk.iid.name, "data");
    assert!(disk.iid.provider_id.starts_with("vol-"));
    assert_eq!(disk.disk_type, "gp3");
    assert_eq!(disk.disk_size, 20);
    assert_eq!(disk.status, DiskStatus::Available);
    assert_eq!(disk.zone, "us-east-1a");

    let attached = disks
        .attach(&Iid::by_name("data"), &Iid::by_name("app"))
        .await
        .unwrap();
    assert_eq!(attached.status, DiskStatus::Attached);
    assert_eq!(
        attached.owner_vm.map(|v| v.provider_id),
        Some(vm.iid.provider_id.clone())
    );

    assert!(disks.detach(&disk.iid, &vm.iid).await.unwrap());
    let detached = disks.get(&Iid::by_name("data")).await.unwrap();
    assert_eq!(detached.status, DiskStatus::Available);
    assert!(detached.owner_vm.is_none());

    assert!(disks.delete(&Iid::by_name("data")).await.unwrap());
    assert_eq!(h.sim.calls("ec2:DeleteVolume"), 1);

    // already gone: reported as deleted without another delete call
    assert!(disks.delete(&Iid::by_name("data")).await.unwrap());
    assert_eq!(h.sim.calls("ec2:DeleteVolume"), 1);
}

#[tokio::test]
async fn test_invalid_size_makes_no_provider_call() {
    let h = harness();

    let err = h
        .driver
        .disks()
        .create(DiskRequest {
            name: "data".to_string(),
            disk_type: "gp3".to_string(),
            disk_size: "5".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)), "{err}");
    assert!(err.to_string().contains("at least 10 GB"), "{err}");

    assert_eq!(h.sim.total_calls(), 0);
    assert!(h.log.records().is_empty());
}

#[tokio::test]
async fn test_default_size_is_type_minimum() {
    let h = harness();
    let disk = h.driver.disks().create(data_disk("scratch", "")).await.unwrap();
    assert_eq!(disk.disk_type, "gp3");
    assert_eq!(disk.disk_size, 10);
}

#[tokio::test]
async fn test_volume_failing_during_creation_aborts_wait() {
    let h = harness();
    h.sim.fail_creations("volume", 1);

    let err = h.driver.disks().create(data_disk("data", "20")).await.unwrap_err();
    match err {
        ReconError::Aborted { kind, status, .. } => {
            assert_eq!(kind, ResourceKind::Disk);
            assert_eq!(status, DiskStatus::Error.to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
    // stops at the first failed read instead of polling until the deadline
    assert!(h.sim.calls("ec2:DescribeVolumes") <= 4);

    // the next volume is unaffected
    let disk = h.driver.disks().create(data_disk("logs", "20")).await.unwrap();
    assert_eq!(disk.status, DiskStatus::Available);
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    let h = harness();
    h.driver.disks().create(data_disk("data", "10")).await.unwrap();

    let err = h.driver.disks().create(data_disk("data", "10")).await.unwrap_err();
    assert!(matches!(err, ReconError::AlreadyExists { .. }), "{err}");
    assert_eq!(h.sim.calls("ec2:CreateVolume"), 1);
}

#[tokio::test]
async fn test_ambiguous_name_and_id_fast_path() {
    let h = harness();
    for _ in 0..2 {
        h.sim
            .call(
                "ec2:CreateVolume",
                json!({
                    "AvailabilityZone": "us-east-1a",
                    "Size": 8,
                    "TagSpecifications": [
                        { "ResourceType": "volume", "Tags": [{ "Key": "Name", "Value": "twin" }] }
                    ]
                }),
            )
            .unwrap();
    }

    let err = h.driver.disks().get(&Iid::by_name("twin")).await.unwrap_err();
    match err {
        ReconError::AmbiguousResult { name, count, .. } => {
            assert_eq!(name, "twin");
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let listed = h.driver.disks().list().await.unwrap();
    assert_eq!(listed.len(), 2);

    // a provider id skips the name lookup entirely
    let id = listed[0].iid.provider_id.clone();
    h.sim.reset_calls();
    let disk = h
        .driver
        .disks()
        .get(&Iid::new("some-other-name", id.clone()))
        .await
        .unwrap();
    assert_eq!(disk.iid.provider_id, id);
    assert_eq!(disk.iid.name, "twin");
    assert_eq!(h.sim.calls("ec2:DescribeVolumes"), 1);
}

#[tokio::test]
async fn test_resize_must_grow() {
    let h = harness();
    h.driver.disks().create(data_disk("data", "20")).await.unwrap();

    let err = h
        .driver
        .disks()
        .change_size(&Iid::by_name("data"), "10")
        .await
        .unwrap_err();
    assert!(matches!(err, ReconError::Validation(_)), "{err}");

    let grown = h
        .driver
        .disks()
        .change_size(&Iid::by_name("data"), "50")
        .await
        .unwrap();
    assert_eq!(grown.disk_size, 50);
}

#[tokio::test]
async fn test_attached_disk_cannot_be_deleted() {
    let h = harness();
    let vm = running_vm(&h, "app").await;
    let disk = h.driver.disks().create(data_disk("data", "10")).await.unwrap();
    h.driver.disks().attach(&disk.iid, &vm.iid).await.unwrap();

    let err = h.driver.disks().delete(&disk.iid).await.unwrap_err();
    assert!(matches!(err, ReconError::ResourceInUse { .. }), "{err}");
}

#[tokio::test]
async fn test_waiter_rides_out_throttling() {
    let h = harness();
    // only the by-id polls carry VolumeIds; the name lookup uses filters
    h.sim.inject(
        Fault::on("ec2:DescribeVolumes")
            .matching("VolumeIds")
            .code("Throttling")
            .times(2),
    );

    let disk = h.driver.disks().create(data_disk("data", "10")).await.unwrap();
    assert_eq!(disk.status, DiskStatus::Available);
    assert_eq!(h.log.failures().len(), 2);
    assert!(h
        .log
        .failures()
        .iter()
        .all(|r| r.operation == "ec2:DescribeVolumes"));
}

#[tokio::test]
async fn test_throttled_lookup_is_not_retried() {
    let h = harness();
    h.sim
        .inject(Fault::on("ec2:DescribeVolumes").code("Throttling").times(1));

    let err = h.driver.disks().create(data_disk("data", "10")).await.unwrap_err();
    assert!(matches!(err, ReconError::ProviderTransient { .. }), "{err}");
    assert!(err.is_transient());
    assert_eq!(h.sim.calls("ec2:CreateVolume"), 0);
}
