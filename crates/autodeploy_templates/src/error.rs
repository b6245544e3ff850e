//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering artifacts.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template family or template text for the request.
    #[error("Template not found: {template} (deployment type '{deployment_type}')")]
    NotFound {
        template: String,
        deployment_type: String,
    },

    /// A placeholder had no value.
    #[error("Render error in template {template}: no value for '{field}'")]
    Render { template: String, field: String },

    #[error("Invalid template override at {path:?}: {message}")]
    InvalidOverride { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound { .. })
    }
}
