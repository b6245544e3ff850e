//! Error types for the runner module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while invoking the provisioning tool.
///
/// A non-zero exit status is not an error at this level; it is reported
/// through [`ToolOutput`](crate::ToolOutput) so callers keep the captured output.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Provisioning tool not available: {0}")]
    ToolNotAvailable(String),

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool timeout after {0} seconds")]
    Timeout(u64),

    #[error("Working directory does not exist: {0:?}")]
    MissingWorkdir(PathBuf),

    #[error("Invalid tool output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
