//! Render command - interpret and render without running Terraform.

use std::path::PathBuf;

use anyhow::Result;
use autodeploy_core::PipelineError;
use autodeploy_iac::workspace;
use clap::Args;

use super::Cli;
use crate::output;

#[derive(Args)]
pub struct RenderArgs {
    /// Deployment instruction
    pub instruction: String,

    /// Write the rendered files into this directory
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

pub async fn execute(cli: &Cli, args: &RenderArgs) -> Result<()> {
    let config = cli.load_config()?;
    let pipeline = cli.pipeline(&config)?;

    let prepared = pipeline.prepare(&args.instruction).await?;

    if let Some(dir) = &args.out {
        let written = workspace::write_artifacts(dir, &prepared.artifacts)
            .map_err(PipelineError::from)?;
        if !cli.json {
            println!("📁 Wrote {} files to {}", written.len(), dir.display());
        }
    }

    if cli.json {
        output::print_json(&prepared)
    } else {
        // Without an output directory, show the files themselves
        output::print_prepared(&prepared, cli.verbose || args.out.is_none());
        Ok(())
    }
}
