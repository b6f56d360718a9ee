//! Injected failures

use crate::error::SimError;

/// A failure the simulator answers with instead of running an operation
///
/// ```ignore
/// sim.inject(Fault::on("eks:DescribeNodegroup").matching("gpu").code("InternalError"));
/// ```
#[derive(Debug, Clone)]
pub struct Fault {
    operation: String,
    needle: Option<String>,
    code: String,
    message: String,
    /// `None` fires forever
    remaining: Option<u32>,
}

impl Fault {
    pub fn on(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            needle: None,
            code: "InternalError".to_string(),
            message: "injected failure".to_string(),
            remaining: None,
        }
    }

    /// Fire only when the serialized request contains `needle`
    pub fn matching(mut self, needle: &str) -> Self {
        self.needle = Some(needle.to_string());
        self
    }

    pub fn code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn times(mut self, n: u32) -> Self {
        self.remaining = Some(n);
        self
    }

    pub(crate) fn fires_on(&self, operation: &str, body: &str) -> bool {
        self.operation == operation
            && !self.is_spent()
            && self.needle.as_deref().is_none_or(|n| body.contains(n))
    }

    pub(crate) fn take(&mut self) -> SimError {
        if let Some(n) = self.remaining.as_mut() {
            *n = n.saturating_sub(1);
        }
        SimError::api(&self.code, self.message.clone())
    }

    pub(crate) fn is_spent(&self) -> bool {
        self.remaining == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_matches_operation_and_body() {
        let fault = Fault::on("ec2:DescribeVolumes").matching("vol-7");
        assert!(fault.fires_on("ec2:DescribeVolumes", r#"{"VolumeIds":["vol-7"]}"#));
        assert!(!fault.fires_on("ec2:DescribeVolumes", r#"{"VolumeIds":["vol-8"]}"#));
        assert!(!fault.fires_on("ec2:DeleteVolume", r#"{"VolumeId":"vol-7"}"#));
    }

    #[test]
    fn test_fault_runs_out() {
        let mut fault = Fault::on("eks:DescribeCluster").code("Throttling").times(1);
        assert!(fault.fires_on("eks:DescribeCluster", "{}"));
        assert_eq!(fault.take().code(), "Throttling");
        assert!(fault.is_spent());
        assert!(!fault.fires_on("eks:DescribeCluster", "{}"));
    }
}
