//! Terraform CLI wrapper.
//!
//! Runs the `terraform` binary either directly or inside a Docker/Podman
//! container with the working directory mounted at `/workspace`.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{ExecutionMode, ToolConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::tool::{ProvisioningTool, ToolOperation, ToolOutput, PLAN_FILE};

const CONTAINER_WORKDIR: &str = "/workspace";

/// One command in an operation, with its own timeout.
struct Step {
    args: Vec<String>,
    timeout: Option<Duration>,
}

/// Terraform invoked through its command line.
#[derive(Debug, Clone, Default)]
pub struct TerraformCli {
    config: ToolConfig,
}

impl TerraformCli {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Check whether the binary (or container runtime) can be started.
    pub async fn is_available(&self) -> bool {
        let program = self.program();
        Command::new(program)
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn program(&self) -> &str {
        match self.config.mode {
            ExecutionMode::Local => self.config.binary.as_str(),
            ExecutionMode::Container => self.config.runtime.command(),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        (self.config.timeout_secs > 0).then(|| Duration::from_secs(self.config.timeout_secs))
    }

    fn step(&self, args: &[&str], timeout: Option<Duration>) -> Step {
        Step {
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout,
        }
    }

    /// Build the full argument list, wrapping in `<runtime> run` for container mode.
    fn build_args(&self, working_dir: Option<&Path>, args: &[String]) -> Vec<String> {
        match self.config.mode {
            ExecutionMode::Local => args.to_vec(),
            ExecutionMode::Container => {
                let mut full = vec!["run".to_string(), "--rm".to_string()];

                if let Some(dir) = working_dir {
                    full.push("-v".to_string());
                    full.push(format!("{}:{}", dir.display(), CONTAINER_WORKDIR));
                    full.push("-w".to_string());
                    full.push(CONTAINER_WORKDIR.to_string());
                }

                if let Some(network) = &self.config.network {
                    full.push("--network".to_string());
                    full.push(network.clone());
                }

                full.push("-e".to_string());
                full.push("TF_IN_AUTOMATION=1".to_string());
                for (key, value) in &self.config.env {
                    full.push("-e".to_string());
                    full.push(format!("{}={}", key, value));
                }

                full.push(self.config.full_image());
                full.extend(args.iter().cloned());
                full
            }
        }
    }

    /// Format a command for logging with environment values hidden.
    fn format_command(&self, args: &[String]) -> String {
        let mut parts = vec![self.program().to_string()];
        let mut hide_next = false;
        for arg in args {
            if hide_next {
                let key = arg.split('=').next().unwrap_or_default();
                parts.push(format!("{}=***", key));
                hide_next = false;
            } else {
                hide_next = arg == "-e";
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }

    async fn execute(
        &self,
        working_dir: Option<&Path>,
        args: &[String],
        timeout: Option<Duration>,
    ) -> RunnerResult<Output> {
        let full_args = self.build_args(working_dir, args);

        let mut cmd = Command::new(self.program());
        cmd.args(&full_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if self.config.mode == ExecutionMode::Local {
            if let Some(dir) = working_dir {
                cmd.current_dir(dir);
            }
            cmd.env("TF_IN_AUTOMATION", "1");
            cmd.envs(&self.config.env);
        }

        debug!("Executing: {}", self.format_command(&full_args));

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::ToolNotAvailable(format!("{} not found on PATH", self.program()))
            } else {
                RunnerError::ExecutionFailed(format!("Failed to spawn {}: {}", self.program(), e))
            }
        })?;

        // Dropping the future on timeout kills the child
        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| RunnerError::Timeout(limit.as_secs()))??,
            None => child.wait_with_output().await?,
        };
        Ok(output)
    }

    /// Run `steps` in order, stopping at the first non-zero exit.
    async fn run(
        &self,
        operation: ToolOperation,
        working_dir: &Path,
        steps: Vec<Step>,
    ) -> RunnerResult<ToolOutput> {
        let working_dir = resolve_workdir(working_dir)?;
        info!("Running terraform {} in {:?}", operation, working_dir);

        let started_at = Utc::now();
        let start = Instant::now();
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for step in steps {
            let output = self.execute(Some(&working_dir), &step.args, step.timeout).await?;
            stdout.push_str(&String::from_utf8_lossy(&output.stdout));
            stderr.push_str(&String::from_utf8_lossy(&output.stderr));
            exit_code = output.status.code().map(i64::from).unwrap_or(-1);

            if exit_code != 0 {
                warn!(
                    "terraform {} exited with code {}",
                    step.args.first().map(String::as_str).unwrap_or_default(),
                    exit_code
                );
                break;
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "terraform {} finished with exit code {} in {}ms",
            operation, exit_code, duration_ms
        );

        Ok(ToolOutput {
            operation,
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
        })
    }

    fn init_step(&self) -> Step {
        self.step(&["init", "-input=false", "-no-color"], self.timeout())
    }
}

fn resolve_workdir(working_dir: &Path) -> RunnerResult<PathBuf> {
    if !working_dir.is_dir() {
        return Err(RunnerError::MissingWorkdir(working_dir.to_path_buf()));
    }
    // Container mounts need an absolute host path
    Ok(working_dir.canonicalize()?)
}

#[async_trait]
impl ProvisioningTool for TerraformCli {
    async fn version(&self) -> RunnerResult<String> {
        let output = self
            .execute(None, &["version".to_string()], self.timeout())
            .await?;
        if !output.status.success() {
            return Err(RunnerError::ToolNotAvailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    async fn plan(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        let out = format!("-out={}", PLAN_FILE);
        let steps = vec![
            self.init_step(),
            self.step(&["plan", "-input=false", "-no-color", out.as_str()], self.timeout()),
        ];
        self.run(ToolOperation::Plan, working_dir, steps).await
    }

    async fn apply(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        // Never interrupt a running apply
        let steps = vec![self.step(
            &["apply", "-input=false", "-no-color", "-auto-approve", PLAN_FILE],
            None,
        )];
        self.run(ToolOperation::Apply, working_dir, steps).await
    }

    async fn destroy(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        let steps = vec![
            self.init_step(),
            self.step(&["destroy", "-input=false", "-no-color", "-auto-approve"], None),
        ];
        self.run(ToolOperation::Destroy, working_dir, steps).await
    }

    async fn outputs(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        let steps = vec![self.step(&["output", "-json", "-no-color"], self.timeout())];
        self.run(ToolOperation::Outputs, working_dir, steps).await
    }
}
