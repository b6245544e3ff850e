//! # autodeploy_iac
//!
//! Deployment orchestration for AutoDeploy.
//!
//! Writes rendered artifacts into a working directory and drives the
//! provisioning tool through plan, apply and destroy.
//!
//! ## Features
//!
//! - Exclusive, lock-guarded working directories
//! - Lifecycle tracking (`init`, `planned`, `applied`, `destroyed`, `failed`)
//! - Dry runs that plan without applying
//! - Apply is never retried; destroy is retried once after a backoff
//! - Failures reported with the stage, exit code and tool output
//!
//! ## Example
//!
//! ```rust,no_run
//! use autodeploy_iac::Orchestrator;
//! use autodeploy_runner::{TerraformCli, ToolConfig};
//! use autodeploy_spec::ArtifactSet;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run(artifacts: ArtifactSet) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(Arc::new(TerraformCli::new(ToolConfig::default())));
//!
//! let result = orchestrator
//!     .deploy(Path::new("./deployments/web"), &artifacts, true)
//!     .await?;
//! println!("{}", result.status);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod result;
pub mod state;
pub mod workspace;

pub use error::{IacError, IacResult};
pub use lock::{WorkdirLock, LOCK_FILE};
pub use workspace::MANIFEST_FILE;
pub use orchestrator::{Deployment, Orchestrator, DEFAULT_DESTROY_BACKOFF};
pub use result::{ApplyResult, DeploymentResult, DestroyResult, FailureDetail, PlanResult};
pub use state::DeploymentStatus;
