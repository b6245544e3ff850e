//! Destroy command - tear down a previous deployment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use autodeploy_core::PipelineError;
use autodeploy_iac::Orchestrator;
use autodeploy_runner::TerraformCli;
use clap::Args;

use super::{Cli, DeploymentFailed};
use crate::output;

#[derive(Args)]
pub struct DestroyArgs {
    /// Working directory of the deployment
    pub workdir: PathBuf,
}

pub async fn execute(cli: &Cli, args: &DestroyArgs) -> Result<()> {
    let config = cli.load_config()?;

    // Destroy needs only the provisioning tool, not the oracle
    let tool = TerraformCli::new(config.tool_config());
    let orchestrator =
        Orchestrator::new(Arc::new(tool)).with_destroy_backoff(config.destroy_backoff());

    let result = orchestrator
        .destroy(&args.workdir)
        .await
        .map_err(PipelineError::from)?;

    if cli.json {
        output::print_json(&result)?;
    } else {
        output::print_result(&result, cli.verbose);
    }

    match result.error {
        Some(error) => Err(DeploymentFailed {
            stage: error.stage,
            message: error.message,
        }
        .into()),
        None => Ok(()),
    }
}
