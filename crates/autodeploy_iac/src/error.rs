//! Error types for deployment orchestration.

use std::path::PathBuf;

use thiserror::Error;

use crate::state::DeploymentStatus;

/// Result type alias for orchestration operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur while orchestrating a deployment.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Plan failed with exit code {exit_code}")]
    PlanFailed { exit_code: i64, output: String },

    #[error("Apply failed with exit code {exit_code}")]
    ApplyFailed { exit_code: i64, output: String },

    /// Every destroy attempt failed. `exit_code` and `output` come from the
    /// last attempt the tool actually ran.
    #[error("Destroy failed after {attempts} attempt(s): {reason}")]
    DestroyFailed {
        attempts: u32,
        exit_code: Option<i64>,
        output: String,
        reason: String,
    },

    /// Another session holds the working directory.
    #[error("Working directory is busy: {0:?}")]
    DirectoryBusy(PathBuf),

    /// The directory holds Terraform files this crate did not write.
    #[error("Working directory {dir:?} holds Terraform files not written by autodeploy: {}", .files.join(", "))]
    UnmanagedFiles { dir: PathBuf, files: Vec<String> },

    #[error("Working directory not found: {0:?}")]
    WorkdirNotFound(PathBuf),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: DeploymentStatus,
        to: DeploymentStatus,
    },

    #[error("Runner error: {0}")]
    Runner(#[from] autodeploy_runner::RunnerError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IacError {
    /// Exit code reported by the tool, when the failure came from one.
    pub fn exit_code(&self) -> Option<i64> {
        match self {
            IacError::PlanFailed { exit_code, .. } | IacError::ApplyFailed { exit_code, .. } => {
                Some(*exit_code)
            }
            IacError::DestroyFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured tool output, when the failure came from the tool.
    pub fn output(&self) -> Option<&str> {
        match self {
            IacError::PlanFailed { output, .. }
            | IacError::ApplyFailed { output, .. }
            | IacError::DestroyFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, IacError::DirectoryBusy(_))
    }
}
