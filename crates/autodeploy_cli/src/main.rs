//! AutoDeploy CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Instruction could not be parsed
//! - 4: Invalid spec
//! - 5: Render error
//! - 6: Orchestration failure

use std::process::ExitCode;

use autodeploy_core::PipelineError;
use autodeploy_iac::IacError;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{Cli, Commands, DeploymentFailed};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PARSE_ERROR: u8 = 3;
    pub const INVALID_SPEC: u8 = 4;
    pub const RENDER_ERROR: u8 = 5;
    pub const ORCHESTRATION_FAILURE: u8 = 6;
}

const CRATES: [&str; 7] = [
    "autodeploy",
    "autodeploy_core",
    "autodeploy_interpreter",
    "autodeploy_policy",
    "autodeploy_templates",
    "autodeploy_runner",
    "autodeploy_iac",
];

/// Default directives, used only when `RUST_LOG` is unset or invalid.
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    CRATES
        .iter()
        .map(|name| format!("{}={}", name, level))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

fn log_filter(rust_log: Option<String>, verbose: bool) -> EnvFilter {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}

fn init_logging(verbose: bool) {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), verbose);

    if let Err(e) = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
    {
        eprintln!("⚠️  Logging not initialized: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Deploy(args) => commands::deploy::execute(&cli, args, args.dry_run).await,
        Commands::Plan(args) => commands::deploy::execute(&cli, args, true).await,
        Commands::Render(args) => commands::render::execute(&cli, args).await,
        Commands::Destroy(args) => commands::destroy::execute(&cli, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map an error to its exit code by pipeline stage.
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<DeploymentFailed>().is_some() {
        return ExitCodes::ORCHESTRATION_FAILURE;
    }

    match e.downcast_ref::<PipelineError>() {
        Some(PipelineError::Orchestration(IacError::WorkdirNotFound(_))) => ExitCodes::INVALID_ARGS,
        Some(err) => match err.stage() {
            "config" => ExitCodes::INVALID_ARGS,
            "parse" => ExitCodes::PARSE_ERROR,
            "analyze" => ExitCodes::INVALID_SPEC,
            "render" => ExitCodes::RENDER_ERROR,
            "orchestrate" => ExitCodes::ORCHESTRATION_FAILURE,
            _ => ExitCodes::GENERAL_ERROR,
        },
        None => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodeploy_interpreter::ParseError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes_by_stage() {
        let parse = anyhow::Error::from(PipelineError::from(ParseError::EmptyInstruction));
        assert_eq!(categorize_error(&parse), ExitCodes::PARSE_ERROR);

        let config = anyhow::Error::from(PipelineError::Config("no key".into()));
        assert_eq!(categorize_error(&config), ExitCodes::INVALID_ARGS);

        let missing = anyhow::Error::from(PipelineError::from(IacError::WorkdirNotFound(
            PathBuf::from("/nope"),
        )));
        assert_eq!(categorize_error(&missing), ExitCodes::INVALID_ARGS);

        let busy = anyhow::Error::from(PipelineError::from(IacError::DirectoryBusy(
            PathBuf::from("/busy"),
        )));
        assert_eq!(categorize_error(&busy), ExitCodes::ORCHESTRATION_FAILURE);

        let failed = anyhow::Error::from(DeploymentFailed {
            stage: "apply".into(),
            message: "exit code 1".into(),
        });
        assert_eq!(categorize_error(&failed), ExitCodes::ORCHESTRATION_FAILURE);

        assert_eq!(
            categorize_error(&anyhow::anyhow!("boom")),
            ExitCodes::GENERAL_ERROR
        );
    }

    #[test]
    fn test_rust_log_replaces_defaults() {
        let filter = log_filter(Some("autodeploy_iac=trace".to_string()), true).to_string();
        assert!(filter.contains("autodeploy_iac=trace"));
        assert!(!filter.contains("autodeploy_core"));
    }

    #[test]
    fn test_default_directives() {
        assert!(default_directives(false).contains("autodeploy_core=info"));
        assert!(default_directives(true).contains("autodeploy_iac=debug"));
        assert!(default_directives(true).ends_with(",warn"));

        let filter = log_filter(Some("  ".to_string()), false).to_string();
        assert!(filter.contains("autodeploy_policy=info"));
    }
}
