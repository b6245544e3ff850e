//! Provisioning tool trait and types.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RunnerError, RunnerResult};

/// Plan file written by `plan` and consumed by `apply`.
pub const PLAN_FILE: &str = "autodeploy.tfplan";

/// Placeholder shown instead of sensitive output values.
pub const REDACTED: &str = "(sensitive)";

/// Operation performed by the provisioning tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOperation {
    Plan,
    Apply,
    Destroy,
    Outputs,
}

impl ToolOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::Outputs => "outputs",
        }
    }

    /// Whether the operation changes real infrastructure.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Apply | Self::Destroy)
    }
}

impl std::fmt::Display for ToolOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one tool operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub operation: ToolOperation,
    /// Exit code of the last command run (-1 when killed by a signal)
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ToolOutput {
    /// Check if the operation was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Parse the stdout of an `output -json` invocation.
    ///
    /// Sensitive values are replaced with [`REDACTED`].
    pub fn parse_outputs(&self) -> RunnerResult<BTreeMap<String, Value>> {
        let trimmed = self.stdout.trim();
        if trimmed.is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: BTreeMap<String, Value> = serde_json::from_str(trimmed)?;
        raw.into_iter()
            .map(|(name, entry)| {
                let object = entry.as_object().ok_or_else(|| {
                    RunnerError::InvalidOutput(format!("output '{}' is not an object", name))
                })?;
                let sensitive = object
                    .get("sensitive")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let value = if sensitive {
                    Value::String(REDACTED.to_string())
                } else {
                    object.get("value").cloned().unwrap_or(Value::Null)
                };
                Ok((name, value))
            })
            .collect()
    }
}

/// External provisioning tool.
///
/// Every operation runs against a working directory holding the rendered
/// artifacts. The tool owns its state file there; callers never read it.
#[async_trait]
pub trait ProvisioningTool: Send + Sync {
    /// Tool name and version, for diagnostics.
    async fn version(&self) -> RunnerResult<String>;

    /// Initialize and compute a saved plan without changing infrastructure.
    async fn plan(&self, working_dir: &Path) -> RunnerResult<ToolOutput>;

    /// Apply the saved plan.
    async fn apply(&self, working_dir: &Path) -> RunnerResult<ToolOutput>;

    /// Destroy everything recorded in the tool's state.
    async fn destroy(&self, working_dir: &Path) -> RunnerResult<ToolOutput>;

    /// Read the outputs recorded in the tool's state.
    async fn outputs(&self, working_dir: &Path) -> RunnerResult<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str) -> ToolOutput {
        let now = Utc::now();
        ToolOutput {
            operation: ToolOperation::Outputs,
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_parse_outputs_redacts_sensitive_values() {
        let parsed = output(
            r#"{
                "vpc_id": {"sensitive": false, "type": "string", "value": "vpc-123"},
                "db_secret": {"sensitive": true, "type": "string", "value": "arn:secret"}
            }"#,
        )
        .parse_outputs()
        .unwrap();

        assert_eq!(parsed["vpc_id"], Value::String("vpc-123".to_string()));
        assert_eq!(parsed["db_secret"], Value::String(REDACTED.to_string()));
    }

    #[test]
    fn test_parse_empty_outputs() {
        assert!(output("").parse_outputs().unwrap().is_empty());
        assert!(output("{}\n").parse_outputs().unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_outputs() {
        assert!(output("not json").parse_outputs().is_err());
        assert!(output(r#"{"x": 1}"#).parse_outputs().is_err());
    }

    #[test]
    fn test_combined_output() {
        let mut out = output("planned");
        out.stderr = "warning".to_string();
        assert_eq!(out.combined_output(), "planned\nwarning");
    }

    #[test]
    fn test_mutating_operations() {
        assert!(ToolOperation::Apply.is_mutating());
        assert!(ToolOperation::Destroy.is_mutating());
        assert!(!ToolOperation::Plan.is_mutating());
        assert!(!ToolOperation::Outputs.is_mutating());
    }
}
