//! Dual resource identity
//!
//! Every resource carries a user-facing logical name and the provider's own
//! identifier. Callers may address a resource by either; [`resolve`] turns the
//! pair into the provider id that provider calls need.

use crate::error::{ReconError, Result};
use crate::kind::ResourceKind;
use crate::model::KeyValue;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Reserved tag key carrying the logical name on providers without native names
pub const NAME_TAG: &str = "Name";

/// Integrated identifier: logical name plus provider id
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Iid {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider_id: String,
}

impl Iid {
    pub fn new(name: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_id: provider_id.into(),
        }
    }

    /// Address a resource by logical name only
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    /// Address a resource by provider id only
    pub fn by_id(provider_id: impl Into<String>) -> Self {
        Self::new("", provider_id)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.provider_id.is_empty()
    }

    /// Human-readable form used in logs and call records
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.provider_id
        } else {
            &self.name
        }
    }
}

impl std::fmt::Display for Iid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.name.is_empty(), self.provider_id.is_empty()) {
            (false, false) => write!(f, "{} ({})", self.name, self.provider_id),
            (false, true) => f.write_str(&self.name),
            _ => f.write_str(&self.provider_id),
        }
    }
}

/// Resolve an [`Iid`] to its provider id.
///
/// A present `provider_id` is returned as-is without consulting the provider,
/// even when `name` is also set. Otherwise `lookup` is called with the name and
/// must return the provider ids of every match.
pub async fn resolve<F, Fut>(kind: ResourceKind, iid: &Iid, lookup: F) -> Result<String>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Vec<String>>>,
{
    if !iid.provider_id.is_empty() {
        if !iid.name.is_empty() {
            tracing::debug!(
                "{} '{}' addressed by both name and id, using id {}",
                kind,
                iid.name,
                iid.provider_id
            );
        }
        return Ok(iid.provider_id.clone());
    }

    if iid.name.is_empty() {
        return Err(ReconError::validation(format!(
            "{} identifier has neither name nor provider id",
            kind
        )));
    }

    let mut matches = lookup(iid.name.clone()).await?;
    match matches.len() {
        0 => Err(ReconError::not_found(kind, &iid.name)),
        1 => Ok(matches.remove(0)),
        count => Err(ReconError::AmbiguousResult {
            kind,
            name: iid.name.clone(),
            count,
        }),
    }
}

/// First value stored under `key`. Later duplicates are ignored.
pub fn tag_value<'a>(tags: &'a [KeyValue], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.key == key)
        .map(|t| t.value.as_str())
}

/// Recover the logical name of a resource.
///
/// Preference order: the provider's native name, the first `Name` tag, then
/// the provider id itself.
pub fn recover_name(native_name: Option<&str>, tags: &[KeyValue], provider_id: &str) -> String {
    native_name
        .filter(|n| !n.is_empty())
        .or_else(|| tag_value(tags, NAME_TAG).filter(|n| !n.is_empty()))
        .unwrap_or(provider_id)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_lookup(
        calls: Arc<AtomicUsize>,
        result: Vec<String>,
    ) -> impl FnOnce(String) -> std::future::Ready<Result<Vec<String>>> {
        move |_name| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(result))
        }
    }

    #[tokio::test]
    async fn test_resolve_by_id_skips_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let iid = Iid::by_id("vol-123");

        let id = resolve(ResourceKind::Disk, &iid, counting_lookup(calls.clone(), vec![]))
            .await
            .unwrap();

        assert_eq!(id, "vol-123");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_prefers_id_when_both_given() {
        let calls = Arc::new(AtomicUsize::new(0));
        let iid = Iid::new("data", "vol-123");

        let id = resolve(
            ResourceKind::Disk,
            &iid,
            counting_lookup(calls.clone(), vec!["vol-999".into()]),
        )
        .await
        .unwrap();

        assert_eq!(id, "vol-123");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let iid = Iid::by_name("data");

        let id = resolve(
            ResourceKind::Disk,
            &iid,
            counting_lookup(calls.clone(), vec!["vol-1".into()]),
        )
        .await
        .unwrap();

        assert_eq!(id, "vol-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_zero_and_many_matches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let iid = Iid::by_name("data");

        let err = resolve(ResourceKind::Disk, &iid, counting_lookup(calls.clone(), vec![]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = resolve(
            ResourceKind::Disk,
            &iid,
            counting_lookup(calls.clone(), vec!["vol-1".into(), "vol-2".into()]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReconError::AmbiguousResult { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_resolve_empty_iid() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = resolve(
            ResourceKind::Vm,
            &Iid::default(),
            counting_lookup(calls.clone(), vec![]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recover_name_order() {
        let tags = vec![
            KeyValue::new("Owner", "ops"),
            KeyValue::new("Name", "web"),
            KeyValue::new("Name", "shadowed"),
        ];

        assert_eq!(recover_name(Some("native"), &tags, "i-1"), "native");
        assert_eq!(recover_name(None, &tags, "i-1"), "web");
        assert_eq!(recover_name(Some(""), &[], "i-1"), "i-1");
    }
}
