//! Error types for policy module.

use thiserror::Error;

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur during requirement analysis.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The spec names a value with no policy-table entry.
    #[error("Invalid spec: no policy entry for {field} '{value}'")]
    InvalidSpec { field: String, value: String },

    #[error("Policy table '{table}' has no entry for {key}")]
    MissingPolicy { table: String, key: String },

    #[error("Subnet allocation failed: {0}")]
    SubnetAllocation(String),

    #[error("Invalid policy configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PolicyError {
    pub fn invalid_spec(field: impl Into<String>, value: impl Into<String>) -> Self {
        PolicyError::InvalidSpec {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for a spec value that the tables cannot serve.
    pub fn is_invalid_spec(&self) -> bool {
        matches!(self, PolicyError::InvalidSpec { .. })
    }
}
