//! Sequential composite workflows
//!
//! A composite resource is built by running steps strictly in order, each
//! step depending on ids produced by the earlier ones. [`WorkflowRun`]
//! tracks what has been created so a failure can report exactly which
//! sub-resources exist.

use crate::error::{CreatedResource, ReconError, Result};
use crate::kind::ResourceKind;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// What happens to already-created sub-resources when a later step fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositePolicy {
    /// Leave them in place and report their ids
    #[default]
    LeaveInPlace,
    /// Run the registered inverse actions in reverse creation order
    Compensate,
}

pub struct WorkflowRun<'a> {
    kind: ResourceKind,
    name: String,
    policy: CompositePolicy,
    created: Vec<CreatedResource>,
    undo: Vec<(usize, BoxFuture<'a, Result<()>>)>,
}

impl<'a> WorkflowRun<'a> {
    pub fn new(kind: ResourceKind, name: impl Into<String>, policy: CompositePolicy) -> Self {
        Self {
            kind,
            name: name.into(),
            policy,
            created: Vec::new(),
            undo: Vec::new(),
        }
    }

    /// Provider id of the first created sub-resource
    pub fn anchor(&self) -> Option<&str> {
        self.created.first().map(|c| c.provider_id.as_str())
    }

    pub fn created(&self) -> &[CreatedResource] {
        &self.created
    }

    /// Record a sub-resource that has no inverse action
    pub fn record(&mut self, kind: ResourceKind, provider_id: impl Into<String>, step: &str) {
        self.created.push(CreatedResource {
            kind,
            provider_id: provider_id.into(),
            step: step.to_string(),
        });
    }

    /// Record a sub-resource together with the action that deletes it
    pub fn record_with_undo(
        &mut self,
        kind: ResourceKind,
        provider_id: impl Into<String>,
        step: &str,
        undo: BoxFuture<'a, Result<()>>,
    ) {
        self.record(kind, provider_id, step);
        self.undo.push((self.created.len() - 1, undo));
    }

    /// Run one step. A failure is converted into the workflow's error.
    pub async fn step<T, Fut>(&mut self, step: &str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        tracing::info!("{} {}: {}", self.kind, self.name, step);
        match fut.await {
            Ok(value) => Ok(value),
            Err(err) => Err(self.fail(step, err).await),
        }
    }

    /// Convert `err` raised at `step` into the error the caller sees.
    ///
    /// With nothing created the original error is returned unchanged.
    pub async fn fail(&mut self, step: &str, err: ReconError) -> ReconError {
        if self.created.is_empty() {
            return err;
        }

        tracing::warn!(
            "{} {} failed at {} with {} sub-resources created: {}",
            self.kind,
            self.name,
            step,
            self.created.len(),
            err
        );

        let anchor = self.anchor().map(String::from);
        let rolled_back = match self.policy {
            CompositePolicy::LeaveInPlace => false,
            CompositePolicy::Compensate => self.unwind().await,
        };

        // the anchor may have been removed by compensation
        let composite_id = anchor.filter(|id| self.created.iter().any(|c| &c.provider_id == id));
        ReconError::PartialFailure {
            kind: self.kind,
            composite_id,
            created: std::mem::take(&mut self.created),
            failed_step: step.to_string(),
            rolled_back,
            source: Box::new(err),
        }
    }

    /// Returns true when every created sub-resource was removed
    async fn unwind(&mut self) -> bool {
        let mut removed = vec![false; self.created.len()];

        while let Some((index, undo)) = self.undo.pop() {
            let resource = &self.created[index];
            match undo.await {
                Ok(()) => removed[index] = true,
                Err(e) if e.is_not_found() => removed[index] = true,
                Err(e) => tracing::warn!(
                    "could not remove {} {}: {}",
                    resource.kind,
                    resource.provider_id,
                    e
                ),
            }
        }

        let mut index = 0;
        self.created.retain(|_| {
            let keep = !removed[index];
            index += 1;
            keep
        });
        self.created.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_first_step_failure_is_passed_through() {
        let mut run = WorkflowRun::new(ResourceKind::LoadBalancer, "web", CompositePolicy::default());

        let err = run
            .step("target-group", async {
                Err::<(), _>(ReconError::validation("bad protocol"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ReconError::Validation(_)));
    }

    #[tokio::test]
    async fn test_later_failure_reports_created_ids() {
        let mut run = WorkflowRun::new(ResourceKind::LoadBalancer, "web", CompositePolicy::default());

        let tg = run
            .step("target-group", async { Ok::<_, ReconError>("tg-1".to_string()) })
            .await
            .unwrap();
        run.record(ResourceKind::TargetGroup, &tg, "target-group");
        assert_eq!(run.anchor(), Some("tg-1"));

        let err = run
            .step("listener", async {
                Err::<(), _>(ReconError::validation("port"))
            })
            .await
            .unwrap_err();

        match err {
            ReconError::PartialFailure {
                composite_id,
                created,
                failed_step,
                rolled_back,
                ..
            } => {
                assert_eq!(composite_id.as_deref(), Some("tg-1"));
                assert_eq!(created.len(), 1);
                assert_eq!(failed_step, "listener");
                assert!(!rolled_back);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_compensation_runs_in_reverse() {
        let order = Mutex::new(Vec::new());
        let mut run = WorkflowRun::new(ResourceKind::Cluster, "k8s", CompositePolicy::Compensate);

        run.record_with_undo(
            ResourceKind::Cluster,
            "k8s",
            "control-plane",
            Box::pin(async {
                order.lock().unwrap().push("cluster");
                Ok::<(), ReconError>(())
            }),
        );
        run.record_with_undo(
            ResourceKind::NodeGroup,
            "ng-1",
            "node-group:ng-1",
            Box::pin(async {
                order.lock().unwrap().push("ng-1");
                Err::<(), _>(ReconError::not_found(ResourceKind::NodeGroup, "ng-1"))
            }),
        );

        let err = run
            .fail("node-group:ng-2", ReconError::validation("max size"))
            .await;

        assert_eq!(*order.lock().unwrap(), vec!["ng-1", "cluster"]);
        match err {
            ReconError::PartialFailure {
                composite_id,
                created,
                rolled_back,
                ..
            } => {
                assert!(rolled_back);
                assert!(created.is_empty());
                assert_eq!(composite_id, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_id() {
        let mut run = WorkflowRun::new(ResourceKind::Cluster, "k8s", CompositePolicy::Compensate);
        run.record_with_undo(
            ResourceKind::Cluster,
            "k8s",
            "control-plane",
            Box::pin(async {
                Err::<(), _>(ReconError::ResourceInUse {
                    kind: ResourceKind::Cluster,
                    id: "k8s".into(),
                })
            }),
        );

        let err = run.fail("node-group:a", ReconError::validation("x")).await;
        assert_eq!(err.partial_ids(), vec!["k8s"]);
        assert!(matches!(err, ReconError::PartialFailure { rolled_back: false, .. }));
    }
}
