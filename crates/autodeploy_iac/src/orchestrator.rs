//! Deployment orchestration.
//!
//! An [`Orchestrator`] opens [`Deployment`] sessions on working directories.
//! A session owns its directory through a [`WorkdirLock`] and walks the
//! lifecycle `Init -> Planned -> Applied`, with `Destroyed` and `Failed`
//! reachable from any live state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use autodeploy_runner::{ProvisioningTool, RunnerError, ToolOutput, PLAN_FILE};
use autodeploy_spec::ArtifactSet;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{IacError, IacResult};
use crate::lock::WorkdirLock;
use crate::result::{ApplyResult, DeploymentResult, DestroyResult, FailureDetail, PlanResult};
use crate::state::DeploymentStatus;
use crate::workspace;

/// Default wait before the single destroy retry.
pub const DEFAULT_DESTROY_BACKOFF: Duration = Duration::from_secs(5);

const DESTROY_ATTEMPTS: u32 = 2;

/// Opens deployment sessions against a provisioning tool.
#[derive(Clone)]
pub struct Orchestrator {
    tool: Arc<dyn ProvisioningTool>,
    destroy_backoff: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("destroy_backoff", &self.destroy_backoff)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(tool: Arc<dyn ProvisioningTool>) -> Self {
        Self {
            tool,
            destroy_backoff: DEFAULT_DESTROY_BACKOFF,
        }
    }

    /// Set the wait before retrying a failed destroy.
    pub fn with_destroy_backoff(mut self, backoff: Duration) -> Self {
        self.destroy_backoff = backoff;
        self
    }

    pub fn tool(&self) -> &Arc<dyn ProvisioningTool> {
        &self.tool
    }

    /// Open a session on `working_dir`, creating it if needed.
    pub fn open(&self, working_dir: &Path) -> IacResult<Deployment> {
        let lock = WorkdirLock::acquire(working_dir)?;
        info!("Opened deployment session in {:?}", working_dir);
        Ok(Deployment {
            tool: Arc::clone(&self.tool),
            destroy_backoff: self.destroy_backoff,
            working_dir: working_dir.to_path_buf(),
            status: DeploymentStatus::Init,
            artifacts: Vec::new(),
            outputs: BTreeMap::new(),
            plan_output: None,
            apply_output: None,
            destroy_output: None,
            error: None,
            started_at: Utc::now(),
            _lock: lock,
        })
    }

    /// Plan `artifacts` in `working_dir`, then apply unless `dry_run`.
    ///
    /// Tool failures are reported in the result with status `Failed`; only
    /// failing to open the session is an error.
    pub async fn deploy(
        &self,
        working_dir: &Path,
        artifacts: &ArtifactSet,
        dry_run: bool,
    ) -> IacResult<DeploymentResult> {
        let mut deployment = self.open(working_dir)?;

        let plan = match deployment.plan(artifacts).await {
            Ok(plan) => plan,
            Err(_) => return Ok(deployment.finish()),
        };

        if dry_run {
            info!("Dry run: skipping apply for {:?}", working_dir);
            return Ok(deployment.finish());
        }

        // Failure is already recorded on the session
        let _ = deployment.apply(&plan).await;
        Ok(deployment.finish())
    }

    /// Destroy the infrastructure recorded in an existing `working_dir`.
    pub async fn destroy(&self, working_dir: &Path) -> IacResult<DeploymentResult> {
        if !working_dir.is_dir() {
            return Err(IacError::WorkdirNotFound(working_dir.to_path_buf()));
        }

        let mut deployment = self.open(working_dir)?;
        deployment.artifacts = workspace::artifact_names(working_dir)?;
        let _ = deployment.destroy().await;
        Ok(deployment.finish())
    }
}

/// A deployment session holding its working directory.
pub struct Deployment {
    tool: Arc<dyn ProvisioningTool>,
    destroy_backoff: Duration,
    working_dir: PathBuf,
    status: DeploymentStatus,
    artifacts: Vec<String>,
    outputs: BTreeMap<String, Value>,
    plan_output: Option<String>,
    apply_output: Option<String>,
    destroy_output: Option<String>,
    error: Option<FailureDetail>,
    started_at: DateTime<Utc>,
    _lock: WorkdirLock,
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("working_dir", &self.working_dir)
            .field("status", &self.status)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl Deployment {
    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn error(&self) -> Option<&FailureDetail> {
        self.error.as_ref()
    }

    fn transition(&mut self, next: DeploymentStatus) -> IacResult<()> {
        if !self.status.can_transition_to(&next) {
            return Err(IacError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        debug!("Deployment {:?}: {} -> {}", self.working_dir, self.status, next);
        self.status = next;
        Ok(())
    }

    /// Record `err` against `stage` and move to `Failed`.
    fn fail(&mut self, stage: &str, err: IacError) -> IacError {
        error!("{} failed in {:?}: {}", stage, self.working_dir, err);
        self.error = Some(FailureDetail::from_error(stage, &err));
        if let Err(transition) = self.transition(DeploymentStatus::Failed) {
            warn!("{}", transition);
        }
        err
    }

    /// Write `artifacts` and compute a saved plan. Safe to repeat.
    pub async fn plan(&mut self, artifacts: &ArtifactSet) -> IacResult<PlanResult> {
        if !self.status.can_transition_to(&DeploymentStatus::Planned) {
            return Err(IacError::InvalidTransition {
                from: self.status,
                to: DeploymentStatus::Planned,
            });
        }

        if let Err(e) = workspace::write_artifacts(&self.working_dir, artifacts) {
            return Err(self.fail("plan", e));
        }
        self.artifacts = artifacts.names().iter().map(|n| n.to_string()).collect();

        let output = match self.tool.plan(&self.working_dir).await {
            Ok(output) => output,
            Err(e) => return Err(self.fail("plan", e.into())),
        };
        self.plan_output = Some(output.combined_output());

        if !output.success() {
            let err = IacError::PlanFailed {
                exit_code: output.exit_code,
                output: output.combined_output(),
            };
            return Err(self.fail("plan", err));
        }

        self.transition(DeploymentStatus::Planned)?;
        info!("Planned {:?} in {}ms", self.working_dir, output.duration_ms);

        Ok(PlanResult {
            working_dir: self.working_dir.clone(),
            plan_file: self.working_dir.join(PLAN_FILE),
            output,
        })
    }

    /// Apply a saved plan. Never retried.
    pub async fn apply(&mut self, plan: &PlanResult) -> IacResult<ApplyResult> {
        if !self.status.can_transition_to(&DeploymentStatus::Applied) {
            return Err(IacError::InvalidTransition {
                from: self.status,
                to: DeploymentStatus::Applied,
            });
        }
        debug!("Applying {:?}", plan.plan_file);

        let output = match self.tool.apply(&self.working_dir).await {
            Ok(output) => output,
            Err(e) => return Err(self.fail("apply", e.into())),
        };
        self.apply_output = Some(output.combined_output());

        if !output.success() {
            let err = IacError::ApplyFailed {
                exit_code: output.exit_code,
                output: output.combined_output(),
            };
            return Err(self.fail("apply", err));
        }

        self.transition(DeploymentStatus::Applied)?;
        info!("Applied {:?} in {}ms", self.working_dir, output.duration_ms);

        self.outputs = match self.outputs().await {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!("Could not read outputs from {:?}: {}", self.working_dir, e);
                BTreeMap::new()
            }
        };

        Ok(ApplyResult {
            output,
            outputs: self.outputs.clone(),
        })
    }

    /// Destroy everything in the tool's state, retrying once after the backoff.
    pub async fn destroy(&mut self) -> IacResult<DestroyResult> {
        if !self.status.can_transition_to(&DeploymentStatus::Destroyed) {
            return Err(IacError::InvalidTransition {
                from: self.status,
                to: DeploymentStatus::Destroyed,
            });
        }

        let mut last_output: Option<ToolOutput> = None;
        let mut last_error: Option<RunnerError> = None;
        for attempt in 1..=DESTROY_ATTEMPTS {
            if attempt > 1 {
                warn!(
                    "Retrying destroy of {:?} in {:?}",
                    self.working_dir, self.destroy_backoff
                );
                tokio::time::sleep(self.destroy_backoff).await;
            }

            match self.tool.destroy(&self.working_dir).await {
                Ok(output) if output.success() => {
                    self.destroy_output = Some(output.combined_output());
                    self.transition(DeploymentStatus::Destroyed)?;
                    info!("Destroyed {:?} after {} attempt(s)", self.working_dir, attempt);
                    return Ok(DestroyResult {
                        output,
                        attempts: attempt,
                    });
                }
                Ok(output) => {
                    warn!(
                        "Destroy attempt {} exited with code {}",
                        attempt, output.exit_code
                    );
                    self.destroy_output = Some(output.combined_output());
                    last_output = Some(output);
                    last_error = None;
                }
                Err(e) => {
                    warn!("Destroy attempt {} could not run: {}", attempt, e);
                    last_error = Some(e);
                }
            }
        }

        let mut reasons = Vec::new();
        if let Some(output) = &last_output {
            reasons.push(format!("exit code {}", output.exit_code));
        }
        if let Some(e) = &last_error {
            reasons.push(format!("last attempt could not run: {}", e));
        }
        let err = IacError::DestroyFailed {
            attempts: DESTROY_ATTEMPTS,
            exit_code: last_output.as_ref().map(|o| o.exit_code),
            output: last_output
                .map(|o| o.combined_output())
                .unwrap_or_default(),
            reason: reasons.join("; "),
        };
        Err(self.fail("destroy", err))
    }

    /// Read the tool's outputs. Does not change state.
    pub async fn outputs(&self) -> IacResult<BTreeMap<String, Value>> {
        let output = self.tool.outputs(&self.working_dir).await?;
        if !output.success() {
            return Err(RunnerError::InvalidOutput(output.combined_output()).into());
        }
        Ok(output.parse_outputs()?)
    }

    /// Close the session and release the working directory.
    pub fn finish(self) -> DeploymentResult {
        info!("Deployment in {:?} finished as {}", self.working_dir, self.status);
        DeploymentResult {
            status: self.status,
            working_dir: self.working_dir,
            artifacts: self.artifacts,
            outputs: self.outputs,
            plan_output: self.plan_output,
            apply_output: self.apply_output,
            destroy_output: self.destroy_output,
            error: self.error,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
