//! Deploy and plan commands.

use std::path::PathBuf;

use anyhow::Result;
use autodeploy_core::RunOptions;
use clap::Args;
use serde_json::json;
use tracing::info;

use super::{Cli, DeploymentFailed};
use crate::output;

#[derive(Args)]
pub struct DeployArgs {
    /// Deployment instruction, e.g. "Deploy a Node.js app on AWS using EC2"
    pub instruction: String,

    /// Only plan the deployment without applying changes
    #[arg(long, alias = "plan")]
    pub dry_run: bool,

    /// Working directory to use instead of a fresh one
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,
}

pub async fn execute(cli: &Cli, args: &DeployArgs, dry_run: bool) -> Result<()> {
    let config = cli.load_config()?;
    let pipeline = cli.pipeline(&config)?;

    let prepared = pipeline.prepare(&args.instruction).await?;
    if !cli.json {
        output::print_prepared(&prepared, cli.verbose);
    }

    let mut options = if dry_run {
        RunOptions::dry_run()
    } else {
        RunOptions::apply()
    };
    if let Some(dir) = &args.workdir {
        options = options.with_working_dir(dir);
    }

    let result = pipeline.deploy(&prepared, options).await?;
    info!(
        "Deployment finished as {} in {}ms",
        result.status,
        result.duration_ms()
    );

    if cli.json {
        output::print_json(&json!({
            "spec": prepared.spec,
            "defaulted": prepared.defaulted,
            "plan": prepared.plan,
            "result": result,
        }))?;
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
