//! Error types for the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised before or while handing a deployment to the orchestrator.
///
/// Failures of the provisioning tool itself are not errors: they are
/// reported in a `Failed` deployment result.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read configuration {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Oracle error: {0}")]
    Oracle(#[from] autodeploy_interpreter::OracleError),

    #[error("Parse error: {0}")]
    Parse(#[from] autodeploy_interpreter::ParseError),

    #[error("Policy error: {0}")]
    InvalidSpec(#[from] autodeploy_policy::PolicyError),

    #[error("Render error: {0}")]
    Render(#[from] autodeploy_templates::TemplateError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] autodeploy_iac::IacError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Config(_)
            | PipelineError::ConfigRead { .. }
            | PipelineError::ConfigParse(_)
            | PipelineError::Oracle(_) => "config",
            PipelineError::Parse(_) => "parse",
            PipelineError::InvalidSpec(_) => "analyze",
            PipelineError::Render(_) => "render",
            PipelineError::Orchestration(_) => "orchestrate",
            PipelineError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodeploy_interpreter::ParseError;
    use autodeploy_policy::PolicyError;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineError::from(ParseError::EmptyInstruction).stage(), "parse");
        assert_eq!(
            PipelineError::from(PolicyError::invalid_spec("deployment_type", "mainframe")).stage(),
            "analyze"
        );
        assert_eq!(PipelineError::Config("no key".into()).stage(), "config");
    }
}
