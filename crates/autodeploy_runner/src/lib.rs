//! # autodeploy_runner
//!
//! Provisioning tool execution wrapper for AutoDeploy.
//!
//! The orchestrator talks to infrastructure only through the
//! [`ProvisioningTool`] trait. This crate provides the Terraform CLI
//! implementation and a mock for tests.
//!
//! # Features
//!
//! - **Local or containerized**: run `terraform` from `PATH` or inside
//!   `hashicorp/terraform` via Docker/Podman
//! - **Timeouts**: non-mutating commands are bounded; `apply` and `destroy`
//!   are never interrupted
//! - **Credentials**: passed as `TF_VAR_*` environment variables and hidden
//!   from logs
//! - **Mock Tool**: scripted responses and call capture for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use autodeploy_runner::{ProvisioningTool, TerraformCli, ToolConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool = TerraformCli::new(ToolConfig::default().tf_var("region", "us-east-1"));
//!
//!     let plan = tool.plan(Path::new("./deploy")).await?;
//!     println!("Exit code: {}", plan.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod terraform;
pub mod tool;

pub use config::{ContainerRuntime, ExecutionMode, ToolConfig};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockTool};
pub use terraform::TerraformCli;
pub use tool::{ProvisioningTool, ToolOperation, ToolOutput, PLAN_FILE, REDACTED};
