//! Provider state tables

use crate::shapes::VolumeAttachment;
use skyrecon_core::{
    ClusterStatus, DiskStatus, ImageStatus, LoadBalancerStatus, NodeGroupStatus, PublicIpStatus,
    StatusTable, VmStatus,
};

pub const VOLUME_STATES: StatusTable<DiskStatus> = StatusTable::new(&[
    ("creating", DiskStatus::Creating),
    ("available", DiskStatus::Available),
    ("in-use", DiskStatus::Attached),
    ("deleting", DiskStatus::Deleting),
    ("deleted", DiskStatus::Deleted),
    ("error", DiskStatus::Error),
]);

pub const ATTACHMENT_STATES: StatusTable<DiskStatus> = StatusTable::new(&[
    ("attaching", DiskStatus::Attaching),
    ("attached", DiskStatus::Attached),
    ("busy", DiskStatus::Attached),
    ("detaching", DiskStatus::Detaching),
    ("detached", DiskStatus::Available),
]);

pub const INSTANCE_STATES: StatusTable<VmStatus> = StatusTable::new(&[
    ("pending", VmStatus::Creating),
    ("running", VmStatus::Running),
    ("stopping", VmStatus::Suspending),
    ("stopped", VmStatus::Suspended),
    ("rebooting", VmStatus::Rebooting),
    ("shutting-down", VmStatus::Terminating),
    ("terminated", VmStatus::Terminated),
]);

pub const IMAGE_STATES: StatusTable<ImageStatus> = StatusTable::new(&[
    ("pending", ImageStatus::Creating),
    ("transient", ImageStatus::Creating),
    ("available", ImageStatus::Available),
    ("deregistered", ImageStatus::Deleted),
    ("invalid", ImageStatus::Error),
    ("failed", ImageStatus::Error),
    ("error", ImageStatus::Error),
]);

pub const LOAD_BALANCER_STATES: StatusTable<LoadBalancerStatus> = StatusTable::new(&[
    ("provisioning", LoadBalancerStatus::Creating),
    ("active", LoadBalancerStatus::Active),
    ("active_impaired", LoadBalancerStatus::Impaired),
    ("failed", LoadBalancerStatus::Error),
]);

pub const CLUSTER_STATES: StatusTable<ClusterStatus> = StatusTable::new(&[
    ("CREATING", ClusterStatus::Creating),
    ("PENDING", ClusterStatus::Creating),
    ("ACTIVE", ClusterStatus::Active),
    ("UPDATING", ClusterStatus::Updating),
    ("DELETING", ClusterStatus::Deleting),
    ("FAILED", ClusterStatus::Error),
]);

pub const NODEGROUP_STATES: StatusTable<NodeGroupStatus> = StatusTable::new(&[
    ("CREATING", NodeGroupStatus::Creating),
    ("ACTIVE", NodeGroupStatus::Active),
    ("UPDATING", NodeGroupStatus::Updating),
    ("DEGRADED", NodeGroupStatus::Degraded),
    ("DELETING", NodeGroupStatus::Deleting),
    ("CREATE_FAILED", NodeGroupStatus::Error),
    ("DELETE_FAILED", NodeGroupStatus::Error),
]);

/// Volume status as seen from `instance_id`.
///
/// The attachment belonging to that instance decides the status; without
/// one, the volume's own state does.
pub fn disk_status(
    state: Option<&str>,
    attachments: &[VolumeAttachment],
    instance_id: Option<&str>,
) -> DiskStatus {
    let attachment = instance_id.and_then(|id| {
        attachments
            .iter()
            .find(|a| a.instance_id.as_deref() == Some(id))
    });

    if let Some(status) = attachment
        .and_then(|a| a.state.as_deref())
        .and_then(|s| ATTACHMENT_STATES.lookup(s))
    {
        return status;
    }

    VOLUME_STATES.normalize(state)
}

/// Elastic IPs have no state of their own
pub fn public_ip_status(association_id: Option<&str>, instance_id: Option<&str>) -> PublicIpStatus {
    if association_id.is_some() || instance_id.is_some() {
        PublicIpStatus::Associated
    } else {
        PublicIpStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrecon_core::CanonicalStatus;

    fn attachment(instance: &str, state: &str) -> VolumeAttachment {
        VolumeAttachment {
            volume_id: Some("vol-1".into()),
            instance_id: Some(instance.into()),
            device: Some("/dev/sdf".into()),
            state: Some(state.into()),
        }
    }

    #[test]
    fn test_disk_status_uses_matching_attachment() {
        let attachments = vec![attachment("i-a", "detaching"), attachment("i-b", "attached")];

        assert_eq!(
            disk_status(Some("in-use"), &attachments, Some("i-b")),
            DiskStatus::Attached
        );
        assert_eq!(
            disk_status(Some("in-use"), &attachments, Some("i-a")),
            DiskStatus::Detaching
        );
    }

    #[test]
    fn test_disk_status_falls_back_to_volume_state() {
        let attachments = vec![attachment("i-a", "attached")];

        assert_eq!(
            disk_status(Some("available"), &attachments, Some("i-z")),
            DiskStatus::Available
        );
        assert_eq!(disk_status(Some("in-use"), &[], None), DiskStatus::Attached);
        assert_eq!(
            disk_status(Some("in-use"), &[attachment("i-a", "weird")], Some("i-a")),
            DiskStatus::Attached
        );
    }

    #[test]
    fn test_instance_states() {
        assert_eq!(INSTANCE_STATES.normalize(Some("stopped")), VmStatus::Suspended);
        assert_eq!(INSTANCE_STATES.normalize(Some("pending")), VmStatus::Creating);
        assert_eq!(INSTANCE_STATES.normalize(Some("hibernating")), VmStatus::Error);
    }

    #[test]
    fn test_every_native_value_maps_into_its_enum() {
        fn closed<S: CanonicalStatus>(table: StatusTable<S>) {
            for (native, status) in table.entries() {
                assert_eq!(table.normalize(Some(native)), *status);
                assert!(S::variants().contains(status));
            }
            assert_eq!(table.normalize(Some("???")), S::UNKNOWN);
        }
        closed(VOLUME_STATES);
        closed(ATTACHMENT_STATES);
        closed(INSTANCE_STATES);
        closed(IMAGE_STATES);
        closed(LOAD_BALANCER_STATES);
        closed(CLUSTER_STATES);
        closed(NODEGROUP_STATES);
    }

    #[test]
    fn test_cluster_states_ignore_case() {
        assert_eq!(CLUSTER_STATES.normalize(Some("active")), ClusterStatus::Active);
        assert_eq!(
            NODEGROUP_STATES.normalize(Some("CREATE_FAILED")),
            NodeGroupStatus::Error
        );
    }

    #[test]
    fn test_public_ip_status() {
        assert_eq!(public_ip_status(None, None), PublicIpStatus::Available);
        assert_eq!(public_ip_status(Some("eipassoc-1"), None), PublicIpStatus::Associated);
    }
}
