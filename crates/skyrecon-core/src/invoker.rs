//! Typed, logged access to a provider gateway

use crate::call_log::{CallLogger, CallRecord};
use crate::error::{ReconError, Result};
use crate::gateway::{ErrorClass, ErrorClassifier, ProviderError, ProviderGateway};
use crate::kind::ResourceKind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// Wraps a [`ProviderGateway`] so that every call is timed, recorded on the
/// call logger, and has its error code classified into a [`ReconError`].
#[derive(Clone)]
pub struct Invoker {
    gateway: Arc<dyn ProviderGateway>,
    classifier: Arc<dyn ErrorClassifier>,
    logger: Arc<dyn CallLogger>,
    region: String,
}

impl Invoker {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        classifier: Arc<dyn ErrorClassifier>,
        logger: Arc<dyn CallLogger>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            classifier,
            logger,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn cloud(&self) -> &str {
        self.gateway.cloud()
    }

    /// Call `operation` with a typed request and decode a typed response.
    ///
    /// `resource` names the resource the call is about and ends up in the
    /// call record and in `NotFound`/`AlreadyExists` errors.
    pub async fn call<Req, Resp>(
        &self,
        kind: ResourceKind,
        resource: &str,
        operation: &str,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let value = self.call_value(kind, resource, operation, request).await?;
        serde_json::from_value(value).map_err(|e| {
            ReconError::malformed(format!("{} response: {}", operation, e))
        })
    }

    /// Call `operation` and discard the response body
    pub async fn call_unit<Req>(
        &self,
        kind: ResourceKind,
        resource: &str,
        operation: &str,
        request: &Req,
    ) -> Result<()>
    where
        Req: Serialize + ?Sized,
    {
        self.call_value(kind, resource, operation, request)
            .await
            .map(|_| ())
    }

    async fn call_value<Req>(
        &self,
        kind: ResourceKind,
        resource: &str,
        operation: &str,
        request: &Req,
    ) -> Result<serde_json::Value>
    where
        Req: Serialize + ?Sized,
    {
        let request = serde_json::to_value(request)
            .map_err(|e| ReconError::validation(format!("{} request: {}", operation, e)))?;

        tracing::debug!("invoke {} {}", operation, request);

        let started = Instant::now();
        let outcome = self.gateway.invoke(operation, request).await;

        self.logger.record(&CallRecord {
            cloud: self.gateway.cloud().to_string(),
            region: self.region.clone(),
            kind,
            resource: resource.to_string(),
            operation: operation.to_string(),
            elapsed: started.elapsed(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        });

        outcome.map_err(|e| self.classify(kind, resource, e))
    }

    fn classify(&self, kind: ResourceKind, resource: &str, err: ProviderError) -> ReconError {
        match self.classifier.classify(&err.code) {
            ErrorClass::NotFound => ReconError::not_found(kind, resource),
            ErrorClass::Duplicate => ReconError::AlreadyExists {
                kind,
                name: resource.to_string(),
            },
            ErrorClass::InUse => ReconError::ResourceInUse {
                kind,
                id: resource.to_string(),
            },
            ErrorClass::Throttled => ReconError::ProviderTransient {
                code: err.code,
                message: err.message,
            },
            ErrorClass::InvalidRequest => {
                ReconError::Validation(format!("{}: {}", err.code, err.message))
            }
            ErrorClass::Other => ReconError::Unknown {
                code: err.code,
                message: err.message,
            },
        }
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("cloud", &self.gateway.cloud())
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_log::MemoryCallLogger;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    struct FixedGateway(std::result::Result<serde_json::Value, ProviderError>);

    #[async_trait]
    impl ProviderGateway for FixedGateway {
        fn cloud(&self) -> &str {
            "test"
        }

        async fn invoke(
            &self,
            _operation: &str,
            _request: serde_json::Value,
        ) -> std::result::Result<serde_json::Value, ProviderError> {
            self.0.clone()
        }
    }

    struct Codes;

    impl ErrorClassifier for Codes {
        fn classify(&self, code: &str) -> ErrorClass {
            match code {
                "Missing" => ErrorClass::NotFound,
                "Slow" => ErrorClass::Throttled,
                _ => ErrorClass::Other,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    struct Echo {
        #[serde(rename = "Id")]
        id: String,
    }

    fn invoker(
        outcome: std::result::Result<serde_json::Value, ProviderError>,
    ) -> (Invoker, Arc<MemoryCallLogger>) {
        let logger = Arc::new(MemoryCallLogger::new());
        let invoker = Invoker::new(
            Arc::new(FixedGateway(outcome)),
            Arc::new(Codes),
            logger.clone(),
            "r1",
        );
        (invoker, logger)
    }

    #[tokio::test]
    async fn test_call_decodes_and_records() {
        let (invoker, logger) = invoker(Ok(json!({"Id": "x-1"})));

        let echo: Echo = invoker
            .call(ResourceKind::Disk, "data", "svc:Op", &json!({}))
            .await
            .unwrap();

        assert_eq!(echo.id, "x-1");
        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, "svc:Op");
        assert_eq!(records[0].region, "r1");
        assert!(records[0].error.is_none());
    }

    #[tokio::test]
    async fn test_error_classification() {
        let (invoker, logger) = invoker(Err(ProviderError::new("Missing", "gone")));
        let err = invoker
            .call_unit(ResourceKind::Disk, "vol-1", "svc:Op", &json!({}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(logger.failures().len(), 1);

        let (invoker, _) = invoker_with("Slow");
        let err = invoker
            .call_unit(ResourceKind::Disk, "vol-1", "svc:Op", &json!({}))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    fn invoker_with(code: &str) -> (Invoker, Arc<MemoryCallLogger>) {
        invoker(Err(ProviderError::new(code, "")))
    }

    #[tokio::test]
    async fn test_missing_field_is_malformed() {
        let (invoker, _) = invoker(Ok(json!({"Other": 1})));
        let err = invoker
            .call::<_, Echo>(ResourceKind::Disk, "data", "svc:Op", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconError::MalformedResponse(_)));
    }
}
