//! Per-call audit records
//!
//! Handlers never write call records themselves; the [`crate::Invoker`]
//! records every gateway call on the injected [`CallLogger`].

use crate::kind::ResourceKind;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub cloud: String,
    pub region: String,
    pub kind: ResourceKind,
    /// Logical name or provider id the call was about
    pub resource: String,
    pub operation: String,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl CallRecord {
    pub fn elapsed_secs(&self) -> String {
        format!("{:.4}", self.elapsed.as_secs_f64())
    }
}

/// Fire-and-forget sink for call records
pub trait CallLogger: Send + Sync {
    fn record(&self, record: &CallRecord);
}

/// Emits call records as `tracing` events on target `skyrecon::call`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCallLogger;

impl CallLogger for TracingCallLogger {
    fn record(&self, record: &CallRecord) {
        match &record.error {
            None => tracing::info!(
                target: "skyrecon::call",
                cloud = %record.cloud,
                region = %record.region,
                kind = %record.kind,
                resource = %record.resource,
                operation = %record.operation,
                elapsed = %record.elapsed_secs(),
                "provider call"
            ),
            Some(error) => tracing::warn!(
                target: "skyrecon::call",
                cloud = %record.cloud,
                region = %record.region,
                kind = %record.kind,
                resource = %record.resource,
                operation = %record.operation,
                elapsed = %record.elapsed_secs(),
                error = %error,
                "provider call failed"
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallLogger;

impl CallLogger for NoopCallLogger {
    fn record(&self, _record: &CallRecord) {}
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryCallLogger {
    records: Mutex<Vec<CallRecord>>,
}

impl MemoryCallLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<CallRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.error.is_some())
            .collect()
    }
}

impl CallLogger for MemoryCallLogger {
    fn record(&self, record: &CallRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(error: Option<&str>) -> CallRecord {
        CallRecord {
            cloud: "aws".into(),
            region: "us-east-1".into(),
            kind: ResourceKind::Disk,
            resource: "data".into(),
            operation: "ec2:CreateVolume".into(),
            elapsed: Duration::from_millis(1500),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_elapsed_format() {
        assert_eq!(record(None).elapsed_secs(), "1.5000");
    }

    #[test]
    fn test_memory_logger_keeps_failures() {
        let logger = MemoryCallLogger::new();
        logger.record(&record(None));
        logger.record(&record(Some("boom")));

        assert_eq!(logger.records().len(), 2);
        assert_eq!(logger.failures().len(), 1);
    }
}
