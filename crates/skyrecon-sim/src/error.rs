//! Simulator errors

use skyrecon_core::ProviderError;
use thiserror::Error;

pub type SimResult<T> = std::result::Result<T, SimError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Error the real provider would answer with
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("malformed request: {0}")]
    Malformed(String),
}

impl SimError {
    pub fn api(code: &str, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Api { code, .. } => code,
            Self::Unsupported(_) => "InvalidAction",
            Self::Malformed(_) => "ValidationError",
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<SimError> for ProviderError {
    fn from(e: SimError) -> Self {
        let code = e.code().to_string();
        match e {
            SimError::Api { message, .. } => ProviderError::new(code, message),
            other => ProviderError::new(code, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_provider_error() {
        let err: ProviderError = SimError::api("VolumeInUse", "vol-1 is attached").into();
        assert_eq!(err.code, "VolumeInUse");
        assert_eq!(err.message, "vol-1 is attached");

        let err: ProviderError = SimError::Unsupported("ec2:Nope".into()).into();
        assert_eq!(err.code, "InvalidAction");
    }
}
