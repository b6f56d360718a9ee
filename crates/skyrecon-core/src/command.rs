//! External driver process gateway
//!
//! Runs `<program> [args..] <operation>` once per call, writes the JSON
//! request to stdin and reads the JSON response from stdout. A failing
//! driver prints `{"Code": "...", "Message": "..."}` on stderr; anything else
//! on stderr is reported with code `DriverFailed`.

use crate::gateway::{ProviderError, ProviderGateway};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Error code used when the driver cannot be started or prints no JSON error
pub const DRIVER_FAILED: &str = "DriverFailed";

pub struct CommandGateway {
    cloud: String,
    program: String,
    args: Vec<String>,
}

impl CommandGateway {
    pub fn new(cloud: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            cloud: cloud.into(),
            program: program.into(),
            args,
        }
    }

    /// Run the driver and return stdout
    async fn run_command(
        &self,
        operation: &str,
        input: &[u8],
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.arg(operation);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {} {}", self.program, self.args.join(" "), operation);

        let mut child = cmd
            .spawn()
            .map_err(|e| ProviderError::new(DRIVER_FAILED, format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .await
                .map_err(|e| ProviderError::new(DRIVER_FAILED, e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProviderError::new(DRIVER_FAILED, e.to_string()))?;

        if !output.status.success() {
            return Err(parse_stderr(&output.stderr));
        }

        Ok(output.stdout)
    }
}

fn parse_stderr(stderr: &[u8]) -> ProviderError {
    serde_json::from_slice::<ProviderError>(stderr).unwrap_or_else(|_| {
        ProviderError::new(DRIVER_FAILED, String::from_utf8_lossy(stderr).trim())
    })
}

#[async_trait]
impl ProviderGateway for CommandGateway {
    fn cloud(&self) -> &str {
        &self.cloud
    }

    async fn invoke(
        &self,
        operation: &str,
        request: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        let input = serde_json::to_vec(&request)
            .map_err(|e| ProviderError::new(DRIVER_FAILED, e.to_string()))?;
        let stdout = self.run_command(operation, &input).await?;

        if stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(serde_json::Value::Object(Default::default()));
        }

        serde_json::from_slice(&stdout).map_err(|e| {
            ProviderError::new(DRIVER_FAILED, format!("{} returned invalid JSON: {}", operation, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sh(script: &str) -> CommandGateway {
        CommandGateway::new("test", "sh", vec!["-c".into(), script.into(), "driver".into()])
    }

    #[test]
    fn test_parse_stderr() {
        let err = parse_stderr(br#"{"Code":"InvalidVolume.NotFound","Message":"no such volume"}"#);
        assert_eq!(err.code, "InvalidVolume.NotFound");
        assert_eq!(err.message, "no such volume");

        let err = parse_stderr(b"segfault\n");
        assert_eq!(err.code, DRIVER_FAILED);
        assert_eq!(err.message, "segfault");
    }

    #[tokio::test]
    async fn test_invoke_echoes_stdin() {
        // `$1` is the operation, stdin is the request
        let gateway = sh("cat");
        let out = gateway
            .invoke("ec2:DescribeVolumes", json!({"VolumeIds": ["vol-1"]}))
            .await
            .unwrap();
        assert_eq!(out, json!({"VolumeIds": ["vol-1"]}));
    }

    #[tokio::test]
    async fn test_invoke_reports_driver_error() {
        let gateway = sh(r#"cat >/dev/null; echo '{"Code":"Throttling","Message":"slow down"}' >&2; exit 1"#);
        let err = gateway.invoke("ec2:DescribeVolumes", json!({})).await.unwrap_err();
        assert_eq!(err.code, "Throttling");
    }

    #[tokio::test]
    async fn test_empty_stdout_is_empty_object() {
        let gateway = sh("cat >/dev/null");
        let out = gateway.invoke("ec2:DeleteVolume", json!({})).await.unwrap();
        assert_eq!(out, json!({}));
    }

    #[tokio::test]
    async fn test_driver_script_dispatches_on_operation() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("driver");
        std::fs::write(
            &script,
            r#"cat >/dev/null
case "$2" in
  ec2:DescribeRegions) echo '{"Regions":[{"RegionName":"us-east-1"}]}' ;;
  *) echo '{"Code":"InvalidAction","Message":"unsupported"}' >&2; exit 2 ;;
esac
"#,
        )
        .unwrap();

        // extra args come before the operation
        let gateway = CommandGateway::new(
            "aws",
            "sh",
            vec![script.to_string_lossy().to_string(), "--profile".into()],
        );
        assert_eq!(gateway.cloud(), "aws");

        let out = tokio_test::assert_ok!(gateway.invoke("ec2:DescribeRegions", json!({})).await);
        assert_eq!(out["Regions"][0]["RegionName"], "us-east-1");

        let err = tokio_test::assert_err!(gateway.invoke("s3:ListBuckets", json!({})).await);
        assert_eq!(err.code, "InvalidAction");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let gateway = CommandGateway::new("test", "/nonexistent/skyrecon-driver", vec![]);
        let err = gateway.invoke("ec2:DescribeVolumes", json!({})).await.unwrap_err();
        assert_eq!(err.code, DRIVER_FAILED);
    }
}
