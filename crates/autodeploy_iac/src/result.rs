//! Operation and deployment results.

use std::collections::BTreeMap;
use std::path::PathBuf;

use autodeploy_runner::ToolOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IacError;
use crate::state::DeploymentStatus;

/// A computed, saved plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub working_dir: PathBuf,
    /// Saved plan consumed by apply
    pub plan_file: PathBuf,
    pub output: ToolOutput,
}

/// An applied plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub output: ToolOutput,
    /// Outputs reported by the tool after apply; empty if they could not be read
    pub outputs: BTreeMap<String, Value>,
}

/// A completed destroy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyResult {
    pub output: ToolOutput,
    /// Number of destroy attempts made, including the successful one
    pub attempts: u32,
}

/// Stage that failed and what the tool reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub stage: String,
    pub message: String,
    pub exit_code: Option<i64>,
    pub output: String,
}

impl FailureDetail {
    pub fn from_error(stage: &str, error: &IacError) -> Self {
        Self {
            stage: stage.to_string(),
            message: error.to_string(),
            exit_code: error.exit_code(),
            output: error.output().unwrap_or_default().to_string(),
        }
    }
}

/// Outcome of a deployment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub status: DeploymentStatus,
    pub working_dir: PathBuf,
    /// Artifact file names in the working directory
    pub artifacts: Vec<String>,
    /// Tool outputs after a successful apply
    pub outputs: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destroy_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDetail>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentResult {
    pub fn is_success(&self) -> bool {
        self.status != DeploymentStatus::Failed
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
