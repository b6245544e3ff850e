//! CLI command definitions.
//!
//! Each subcommand is thin glue over one pipeline entry point.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use autodeploy_core::{DeployConfig, Pipeline, PipelineError};
use autodeploy_interpreter::MockOracle;
use autodeploy_runner::TerraformCli;
use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod deploy;
pub mod destroy;
pub mod render;

/// AutoDeploy - natural language to cloud infrastructure
#[derive(Parser)]
#[command(name = "autodeploy")]
#[command(version, about = "AutoDeploy - natural language to cloud infrastructure")]
#[command(long_about = r#"
AutoDeploy turns a free-text deployment instruction into Terraform for AWS
and drives Terraform through plan, apply and destroy.

COMMANDS:
  deploy   → Interpret, render, plan and apply an instruction
  plan     → Same as deploy --dry-run: plan only, never apply
  render   → Interpret and render only; no Terraform calls
  destroy  → Destroy a previous deployment by working directory

CONFIGURATION:
  autodeploy.toml in the current directory (or --config), overlaid with
  OPENAI_API_KEY, ANTHROPIC_API_KEY, AUTODEPLOY_MODEL, AUTODEPLOY_ENDPOINT_URL,
  AUTODEPLOY_WORKDIR, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_REGION

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Instruction could not be parsed
  4 - Invalid spec
  5 - Render error
  6 - Orchestration failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read the structured spec from a JSON file instead of calling the oracle
    #[arg(long, global = true, value_name = "FILE")]
    pub spec_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy infrastructure described by an instruction
    Deploy(deploy::DeployArgs),

    /// Plan a deployment without applying it
    Plan(deploy::DeployArgs),

    /// Render Terraform for an instruction without running it
    Render(render::RenderArgs),

    /// Destroy a previous deployment
    Destroy(destroy::DestroyArgs),
}

/// A deployment that ran but ended in `failed`.
#[derive(Debug, Error)]
#[error("Deployment failed during {stage}: {message}")]
pub struct DeploymentFailed {
    pub stage: String,
    pub message: String,
}

impl Cli {
    /// Load and check configuration from `--config` or the environment.
    pub fn load_config(&self) -> Result<DeployConfig> {
        Ok(DeployConfig::from_env(self.config.as_deref())?)
    }

    /// Build the pipeline, using the spec file as the oracle when given.
    pub fn pipeline(&self, config: &DeployConfig) -> Result<Pipeline> {
        let Some(path) = &self.spec_file else {
            return Ok(Pipeline::from_config(config)?);
        };

        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("spec file {:?}: {}", path, e)))?;
        let oracle = MockOracle::new().reply(content);
        let tool = TerraformCli::new(config.tool_config());
        Ok(Pipeline::from_config_with(
            config,
            Arc::new(oracle),
            Arc::new(tool),
        )?)
    }
}
