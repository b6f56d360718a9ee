//! Provider gateway contract
//!
//! Every provider call goes through [`ProviderGateway::invoke`]: an operation
//! name and a JSON request in, a JSON response or a coded error out. The
//! gateway knows nothing about resource kinds; handlers give the payloads
//! their meaning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw provider failure, before classification
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ProviderError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Provider name used in call records (e.g. "aws")
    fn cloud(&self) -> &str;

    async fn invoke(
        &self,
        operation: &str,
        request: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ProviderError>;
}

/// Coarse meaning of a provider error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Duplicate,
    InUse,
    Throttled,
    InvalidRequest,
    Other,
}

/// Maps a provider's error codes onto [`ErrorClass`]
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, code: &str) -> ErrorClass;
}
