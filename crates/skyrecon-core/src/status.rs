//! Canonical resource status
//!
//! Provider-native state strings are mapped onto small closed enums, one per
//! resource kind. Values a provider reports that no table knows about map to
//! the kind's `Error` variant, so callers never see an unmapped status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed status enum with a fallback for unknown provider values
pub trait CanonicalStatus:
    Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Status reported for provider values with no mapping
    const UNKNOWN: Self;

    /// Every variant, used by closure checks
    fn variants() -> &'static [Self];
}

macro_rules! canonical_status {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl CanonicalStatus for $name {
            const UNKNOWN: Self = Self::Error;

            fn variants() -> &'static [Self] {
                &[$(Self::$variant),+]
            }
        }
    };
}

canonical_status!(
    /// Block storage volume status
    DiskStatus {
        Creating => "Creating",
        Available => "Available",
        Attaching => "Attaching",
        Attached => "Attached",
        Detaching => "Detaching",
        Deleting => "Deleting",
        Deleted => "Deleted",
        Error => "Error",
    }
);

canonical_status!(
    /// Virtual machine status
    VmStatus {
        Creating => "Creating",
        Running => "Running",
        Suspending => "Suspending",
        Suspended => "Suspended",
        Resuming => "Resuming",
        Rebooting => "Rebooting",
        Terminating => "Terminating",
        Terminated => "Terminated",
        Error => "Error",
    }
);

canonical_status!(
    /// Machine image status
    ImageStatus {
        Creating => "Creating",
        Available => "Available",
        Deleted => "Deleted",
        Error => "Error",
    }
);

canonical_status!(
    /// Public IP status, derived from association state
    PublicIpStatus {
        Available => "Available",
        Associated => "Associated",
        Error => "Error",
    }
);

canonical_status!(
    /// Load balancer composite status. `Incomplete` means the frontend
    /// sub-resource does not exist.
    LoadBalancerStatus {
        Incomplete => "Incomplete",
        Creating => "Creating",
        Active => "Active",
        Impaired => "Impaired",
        Error => "Error",
    }
);

canonical_status!(
    /// Managed Kubernetes control plane status
    ClusterStatus {
        Creating => "Creating",
        Active => "Active",
        Updating => "Updating",
        Deleting => "Deleting",
        Error => "Error",
    }
);

canonical_status!(
    /// Node group status
    NodeGroupStatus {
        Creating => "Creating",
        Active => "Active",
        Updating => "Updating",
        Degraded => "Degraded",
        Deleting => "Deleting",
        Error => "Error",
    }
);

/// Static mapping from provider-native strings to a canonical status
#[derive(Debug, Clone, Copy)]
pub struct StatusTable<S: 'static> {
    entries: &'static [(&'static str, S)],
}

impl<S: CanonicalStatus> StatusTable<S> {
    pub const fn new(entries: &'static [(&'static str, S)]) -> Self {
        Self { entries }
    }

    /// Case-insensitive lookup, returning `None` when the value is unmapped
    pub fn lookup(&self, native: &str) -> Option<S> {
        let native = native.trim();
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(native))
            .map(|(_, s)| *s)
    }

    /// Map a provider value, falling back to [`CanonicalStatus::UNKNOWN`]
    pub fn normalize(&self, native: Option<&str>) -> S {
        match native.and_then(|n| self.lookup(n)) {
            Some(status) => status,
            None => {
                if let Some(n) = native {
                    tracing::debug!("unmapped provider status '{}', reporting {}", n, S::UNKNOWN);
                }
                S::UNKNOWN
            }
        }
    }

    pub fn entries(&self) -> &'static [(&'static str, S)] {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: StatusTable<DiskStatus> = StatusTable::new(&[
        ("creating", DiskStatus::Creating),
        ("available", DiskStatus::Available),
    ]);

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(TABLE.normalize(Some("AVAILABLE")), DiskStatus::Available);
        assert_eq!(TABLE.normalize(Some(" creating ")), DiskStatus::Creating);
    }

    #[test]
    fn test_unknown_and_missing_map_to_error() {
        assert_eq!(TABLE.normalize(Some("quantum")), DiskStatus::Error);
        assert_eq!(TABLE.normalize(Some("")), DiskStatus::Error);
        assert_eq!(TABLE.normalize(None), DiskStatus::Error);
    }

    #[test]
    fn test_unknown_is_a_variant() {
        fn check<S: CanonicalStatus>() {
            assert!(S::variants().contains(&S::UNKNOWN));
        }
        check::<DiskStatus>();
        check::<VmStatus>();
        check::<ImageStatus>();
        check::<PublicIpStatus>();
        check::<LoadBalancerStatus>();
        check::<ClusterStatus>();
        check::<NodeGroupStatus>();
    }

    #[test]
    fn test_display() {
        assert_eq!(VmStatus::Suspended.to_string(), "Suspended");
        assert_eq!(LoadBalancerStatus::Incomplete.to_string(), "Incomplete");
    }
}
