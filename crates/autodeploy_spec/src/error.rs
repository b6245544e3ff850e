//! Error types for the spec module.

use thiserror::Error;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while building or validating specifications.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Oracle response is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("Oracle response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Unknown artifact name: {0}")]
    UnknownArtifact(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
