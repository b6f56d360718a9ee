//! Completion waiter
//!
//! Provider mutations return before the resource has settled. The waiter
//! polls a status probe until the resource reaches a goal, hits a dead-end
//! status, or the deadline passes.

use crate::error::{ReconError, Result};
use crate::kind::ResourceKind;
use crate::status::CanonicalStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Polling schedule and deadline.
///
/// With `multiplier` at 1.0 the waiter polls at a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Delay before the second read (milliseconds)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay (milliseconds)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Overall deadline (milliseconds)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_initial_delay() -> u64 {
    15_000
}
fn default_max_delay() -> u64 {
    15_000
}
fn default_multiplier() -> f64 {
    1.0
}
fn default_timeout() -> u64 {
    600_000
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            timeout_ms: default_timeout(),
        }
    }
}

impl WaitConfig {
    /// Fixed-interval schedule
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        let interval_ms = interval.as_millis() as u64;
        Self {
            initial_delay_ms: interval_ms,
            max_delay_ms: interval_ms,
            multiplier: 1.0,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Delay after the given attempt (milliseconds)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.max(1.0).powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms.max(self.initial_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Per-kind wait settings with a shared default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitPolicy {
    #[serde(default)]
    pub default: Option<WaitConfig>,
    #[serde(default)]
    pub overrides: HashMap<ResourceKind, WaitConfig>,
}

impl WaitPolicy {
    /// Same settings for every kind
    pub fn uniform(config: WaitConfig) -> Self {
        Self {
            default: Some(config),
            overrides: HashMap::new(),
        }
    }

    pub fn for_kind(&self, kind: ResourceKind) -> WaitConfig {
        if let Some(config) = self.overrides.get(&kind) {
            return *config;
        }
        if let Some(config) = self.default {
            return config;
        }
        builtin_config(kind)
    }
}

/// Budgets matching the provider's own waiters
fn builtin_config(kind: ResourceKind) -> WaitConfig {
    let (interval, attempts) = match kind {
        ResourceKind::Cluster => (30, 60),
        ResourceKind::NodeGroup => (30, 80),
        ResourceKind::LoadBalancer => (15, 40),
        ResourceKind::Image => (15, 40),
        ResourceKind::Vm => (15, 40),
        ResourceKind::Disk => (15, 40),
        _ => (5, 24),
    };
    WaitConfig::fixed(
        Duration::from_secs(interval),
        Duration::from_secs(interval * attempts),
    )
}

/// What the waiter is waiting for
#[derive(Debug, Clone, Copy)]
pub enum WaitGoal<'a, S> {
    /// The resource reports one of these statuses
    Reach(&'a [S]),
    /// The resource disappears or reports one of these statuses
    Gone(&'a [S]),
}

pub struct Waiter {
    config: WaitConfig,
}

impl Waiter {
    pub fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    /// Poll `probe` until `goal` holds.
    ///
    /// `probe` returns `Ok(None)` when the resource does not exist. The first
    /// read happens immediately. `dead_ends` abort the wait with
    /// [`ReconError::Aborted`]; when `dead_ends` is empty, the kind's unknown
    /// status is treated as a dead end unless it is part of the goal.
    ///
    /// Transient provider errors and, while reaching a status, not-found
    /// reads count as "not yet". Any other error ends the wait.
    ///
    /// Returns the last observed status, `None` if the resource is gone.
    pub async fn await_status<S, F, Fut>(
        &self,
        kind: ResourceKind,
        id: &str,
        goal: WaitGoal<'_, S>,
        dead_ends: &[S],
        mut probe: F,
    ) -> Result<Option<S>>
    where
        S: CanonicalStatus,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<S>>>,
    {
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let mut attempt = 0u32;
        let mut last: Option<S> = None;

        let (targets, gone_ok) = match goal {
            WaitGoal::Reach(targets) => (targets, false),
            WaitGoal::Gone(targets) => (targets, true),
        };
        let is_dead_end = |s: &S| {
            if dead_ends.is_empty() {
                *s == S::UNKNOWN && !targets.contains(s)
            } else {
                dead_ends.contains(s)
            }
        };

        loop {
            match probe().await {
                Ok(Some(status)) => {
                    if last != Some(status) {
                        tracing::debug!("{} {} is {}", kind, id, status);
                    }
                    last = Some(status);
                    if targets.contains(&status) {
                        return Ok(Some(status));
                    }
                    if is_dead_end(&status) {
                        return Err(ReconError::Aborted {
                            kind,
                            id: id.to_string(),
                            status: status.to_string(),
                        });
                    }
                }
                Ok(None) if gone_ok => return Ok(None),
                Ok(None) => {
                    tracing::debug!("{} {} not visible yet", kind, id);
                }
                Err(err) if err.is_not_found() && !gone_ok => {
                    tracing::debug!("{} {} not visible yet", kind, id);
                }
                Err(err) if err.is_not_found() => return Ok(None),
                Err(err) if err.is_transient() => {
                    tracing::debug!("{} {} poll deferred: {}", kind, id, err);
                }
                Err(err) => return Err(err),
            }

            let delay = Duration::from_millis(self.config.delay_for_attempt(attempt));
            attempt = attempt.saturating_add(1);
            if Instant::now() + delay > deadline {
                return Err(ReconError::Timeout {
                    kind,
                    id: id.to_string(),
                    waited: started.elapsed(),
                    last: last
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "absent".to_string()),
                });
            }
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DiskStatus;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick() -> Waiter {
        Waiter::new(WaitConfig::fixed(
            Duration::from_millis(1),
            Duration::from_millis(200),
        ))
    }

    /// Probe that walks through `script`, repeating the last entry
    fn scripted(
        script: Vec<Result<Option<DiskStatus>>>,
    ) -> (
        impl FnMut() -> std::future::Ready<Result<Option<DiskStatus>>>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut script = script.into_iter().collect::<std::collections::VecDeque<_>>();
        let probe = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().map(|r| match r {
                    Ok(s) => Ok(*s),
                    Err(_) => Err(ReconError::validation("repeat")),
                })
            };
            std::future::ready(next.unwrap_or(Ok(None)))
        };
        (probe, calls)
    }

    #[test]
    fn test_delay_calculation() {
        let config = WaitConfig {
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            multiplier: 2.0,
            timeout_ms: 60_000,
        };

        assert_eq!(config.delay_for_attempt(0), 1000);
        assert_eq!(config.delay_for_attempt(1), 2000);
        assert_eq!(config.delay_for_attempt(2), 4000);
        assert_eq!(config.delay_for_attempt(3), 8000);
        assert_eq!(config.delay_for_attempt(4), 10000); // capped at max
    }

    #[test]
    fn test_fixed_interval() {
        let config = WaitConfig::fixed(Duration::from_secs(5), Duration::from_secs(60));
        assert_eq!(config.delay_for_attempt(0), 5000);
        assert_eq!(config.delay_for_attempt(7), 5000);
    }

    #[test]
    fn test_policy_override() {
        let mut policy = WaitPolicy::default();
        assert_eq!(policy.for_kind(ResourceKind::Cluster).initial_delay_ms, 30_000);

        let quick = WaitConfig::fixed(Duration::from_millis(10), Duration::from_secs(1));
        policy.overrides.insert(ResourceKind::Disk, quick);
        assert_eq!(policy.for_kind(ResourceKind::Disk), quick);
        assert_eq!(policy.for_kind(ResourceKind::Vm).initial_delay_ms, 15_000);
    }

    #[tokio::test]
    async fn test_reach_after_transitions() {
        let (probe, calls) = scripted(vec![
            Ok(None),
            Ok(Some(DiskStatus::Creating)),
            Ok(Some(DiskStatus::Available)),
        ]);

        let status = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Available]),
                &[],
                probe,
            )
            .await
            .unwrap();

        assert_eq!(status, Some(DiskStatus::Available));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_already_settled_reads_once() {
        let (probe, calls) = scripted(vec![Ok(Some(DiskStatus::Available))]);

        quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Available]),
                &[],
                probe,
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_aborts() {
        let (probe, _) = scripted(vec![
            Ok(Some(DiskStatus::Creating)),
            Ok(Some(DiskStatus::Error)),
        ]);

        let err = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Available]),
                &[],
                probe,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReconError::Aborted { ref status, .. } if status == "Error"));
    }

    #[tokio::test]
    async fn test_explicit_dead_end() {
        let (probe, _) = scripted(vec![Ok(Some(DiskStatus::Deleting))]);

        let err = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Attached]),
                &[DiskStatus::Deleting, DiskStatus::Error],
                probe,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReconError::Aborted { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let (probe, calls) = scripted(vec![Ok(Some(DiskStatus::Creating))]);

        let err = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Available]),
                &[],
                probe,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReconError::Timeout { ref last, .. } if last == "Creating"));
        assert!(calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_gone_accepts_absence_and_terminal() {
        let (probe, _) = scripted(vec![Ok(Some(DiskStatus::Deleting)), Ok(None)]);
        let status = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Gone(&[DiskStatus::Deleted]),
                &[],
                probe,
            )
            .await
            .unwrap();
        assert_eq!(status, None);

        let (probe, _) = scripted(vec![Ok(Some(DiskStatus::Deleted))]);
        let status = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Gone(&[DiskStatus::Deleted]),
                &[],
                probe,
            )
            .await
            .unwrap();
        assert_eq!(status, Some(DiskStatus::Deleted));
    }

    #[tokio::test]
    async fn test_transient_errors_keep_polling() {
        let (probe, calls) = scripted(vec![
            Err(ReconError::ProviderTransient {
                code: "Throttling".into(),
                message: "slow down".into(),
            }),
            Err(ReconError::not_found(ResourceKind::Disk, "vol-1")),
            Ok(Some(DiskStatus::Available)),
        ]);

        let status = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Available]),
                &[],
                probe,
            )
            .await
            .unwrap();

        assert_eq!(status, Some(DiskStatus::Available));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_stop() {
        let (probe, calls) = scripted(vec![Err(ReconError::malformed("garbage"))]);

        let err = quick()
            .await_status(
                ResourceKind::Disk,
                "vol-1",
                WaitGoal::Reach(&[DiskStatus::Available]),
                &[],
                probe,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReconError::MalformedResponse(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
