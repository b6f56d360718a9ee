//! Reconciliation error types

use crate::kind::ResourceKind;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A sub-resource that a composite workflow created before failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedResource {
    pub kind: ResourceKind,
    pub provider_id: String,
    /// Workflow step that produced it
    pub step: String,
}

/// Errors surfaced by handlers, orchestrators and the waiter
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("{kind} name '{name}' matches {count} resources")]
    AmbiguousResult {
        kind: ResourceKind,
        name: String,
        count: usize,
    },

    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("{kind} is in use: {id}")]
    ResourceInUse { kind: ResourceKind, id: String },

    #[error("Timed out after {waited:?} waiting for {kind} {id} (last status: {last})")]
    Timeout {
        kind: ResourceKind,
        id: String,
        waited: Duration,
        last: String,
    },

    #[error("{kind} {id} reached {status} while waiting")]
    Aborted {
        kind: ResourceKind,
        id: String,
        status: String,
    },

    #[error(
        "{kind} creation failed at step '{failed_step}' ({} sub-resources left{}): {source}",
        .created.len(),
        rollback_note(.rolled_back)
    )]
    PartialFailure {
        kind: ResourceKind,
        /// Provider id of the composite, if the anchor sub-resource exists
        composite_id: Option<String>,
        created: Vec<CreatedResource>,
        failed_step: String,
        rolled_back: bool,
        #[source]
        source: Box<ReconError>,
    },

    #[error("Provider temporarily unavailable ({code}): {message}")]
    ProviderTransient { code: String, message: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider error ({code}): {message}")]
    Unknown { code: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back { ", rolled back" } else { "" }
}

impl ReconError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderTransient { .. })
    }

    /// Ids of sub-resources left behind by a failed composite create
    pub fn partial_ids(&self) -> Vec<&str> {
        match self {
            Self::PartialFailure { created, .. } => {
                created.iter().map(|c| c.provider_id.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_message_and_ids() {
        let err = ReconError::PartialFailure {
            kind: ResourceKind::LoadBalancer,
            composite_id: Some("tg-1".into()),
            created: vec![CreatedResource {
                kind: ResourceKind::TargetGroup,
                provider_id: "tg-1".into(),
                step: "target-group".into(),
            }],
            failed_step: "listener".into(),
            rolled_back: false,
            source: Box::new(ReconError::validation("bad port")),
        };

        assert_eq!(err.partial_ids(), vec!["tg-1"]);
        let msg = err.to_string();
        assert!(msg.contains("listener"));
        assert!(msg.contains("1 sub-resources left"));
        assert!(!msg.contains("rolled back"));
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: ReconError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ReconError::MalformedResponse(_)));
    }
}
