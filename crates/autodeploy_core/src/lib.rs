//! # autodeploy_core
//!
//! The AutoDeploy pipeline: free-text instruction in, deployment result out.
//!
//! ```text
//! instruction -> interpreter -> StructuredSpec -> analyzer -> ResourcePlan
//!             -> renderer -> ArtifactSet -> orchestrator -> DeploymentResult
//! ```
//!
//! Interpretation, analysis and rendering finish before a working directory
//! is created, so an instruction that fails early leaves nothing on disk.
//!
//! ## Example
//!
//! ```rust,no_run
//! use autodeploy_core::{DeployConfig, Pipeline, RunOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeployConfig::from_env(None)?;
//! let pipeline = Pipeline::from_config(&config)?;
//!
//! let result = pipeline
//!     .run("Deploy a Node.js website on AWS using EC2", RunOptions::dry_run())
//!     .await?;
//! println!("{} in {:?}", result.status, result.working_dir);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{DeployConfig, ProvisioningConfig, CONFIG_FILE};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, Prepared, RunOptions};
