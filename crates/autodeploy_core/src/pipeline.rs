//! Instruction-to-infrastructure pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use autodeploy_iac::{DeploymentResult, Orchestrator};
use autodeploy_interpreter::{InstructionInterpreter, LlmOracle, Oracle};
use autodeploy_policy::{Analyzer, PolicyTables};
use autodeploy_runner::{ProvisioningTool, TerraformCli};
use autodeploy_spec::{ArtifactSet, Backend, ResourcePlan, StructuredSpec, ValidatedSpec};
use autodeploy_templates::{ArtifactRenderer, TemplateStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DeployConfig;
use crate::error::{PipelineError, PipelineResult};

/// Options for a single pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Plan only; never apply
    pub dry_run: bool,
    /// Working directory to use instead of a fresh one under the root
    pub working_dir: Option<PathBuf>,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            working_dir: None,
        }
    }

    pub fn apply() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Everything derived from an instruction before any tool runs.
#[derive(Debug, Clone, Serialize)]
pub struct Prepared {
    pub spec: StructuredSpec,
    /// Fields that fell back to their defaults
    pub defaulted: Vec<String>,
    pub plan: ResourcePlan,
    pub artifacts: ArtifactSet,
}

/// Interprets, analyzes, renders and deploys.
pub struct Pipeline {
    interpreter: InstructionInterpreter,
    analyzer: Analyzer,
    renderer: ArtifactRenderer,
    orchestrator: Orchestrator,
    working_root: PathBuf,
    default_region: Option<String>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("interpreter", &self.interpreter)
            .field("orchestrator", &self.orchestrator)
            .field("working_root", &self.working_root)
            .field("default_region", &self.default_region)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        interpreter: InstructionInterpreter,
        analyzer: Analyzer,
        renderer: ArtifactRenderer,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            interpreter,
            analyzer,
            renderer,
            orchestrator,
            working_root: PathBuf::from("deployments"),
            default_region: None,
        }
    }

    /// Build a pipeline against the configured oracle and Terraform.
    pub fn from_config(config: &DeployConfig) -> PipelineResult<Self> {
        let oracle = LlmOracle::from_config(&config.oracle)?;
        let tool = TerraformCli::new(config.tool_config());
        Self::from_config_with(config, Arc::new(oracle), Arc::new(tool))
    }

    /// Build a pipeline from configuration with the given oracle and tool.
    pub fn from_config_with(
        config: &DeployConfig,
        oracle: Arc<dyn Oracle>,
        tool: Arc<dyn ProvisioningTool>,
    ) -> PipelineResult<Self> {
        config.check()?;
        let interpreter =
            InstructionInterpreter::new(oracle).with_retry(config.oracle.retry_policy());

        let tables = match &config.policy_file {
            Some(path) => PolicyTables::load(path).map_err(|e| {
                PipelineError::Config(format!("policy file {:?}: {}", path, e))
            })?,
            None => PolicyTables::standard(),
        };
        let backend = match &config.endpoint_override {
            Some(endpoint) => Backend::local(endpoint.clone()),
            None => Backend::Aws,
        };
        let analyzer = Analyzer::new(tables).with_backend(backend);

        let store = match &config.template_dir {
            Some(dir) => TemplateStore::builtin()
                .with_override_dir(dir)
                .map_err(|e| PipelineError::Config(format!("template dir {:?}: {}", dir, e)))?,
            None => TemplateStore::builtin(),
        };
        let renderer = ArtifactRenderer::with_store(store);

        let orchestrator = Orchestrator::new(tool).with_destroy_backoff(config.destroy_backoff());

        let mut pipeline = Self::new(interpreter, analyzer, renderer, orchestrator)
            .with_working_root(&config.working_root);
        pipeline.default_region = config.default_region.clone();
        Ok(pipeline)
    }

    pub fn with_working_root(mut self, root: &Path) -> Self {
        self.working_root = root.to_path_buf();
        self
    }

    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    pub fn working_root(&self) -> &Path {
        &self.working_root
    }

    /// Interpret, analyze and render `instruction` without touching disk or
    /// the provisioning tool.
    pub async fn prepare(&self, instruction: &str) -> PipelineResult<Prepared> {
        info!("Instruction received: {}", instruction.trim());
        let validated = self.interpreter.interpret(instruction).await?;
        self.prepare_spec(validated)
    }

    /// Analyze and render an already interpreted spec.
    pub fn prepare_spec(&self, validated: ValidatedSpec) -> PipelineResult<Prepared> {
        let mut spec = validated.spec;
        if let Some(region) = &self.default_region {
            if validated.defaults.iter().any(|d| d.field == "region") {
                info!("Using configured region {}", region);
                spec.region = region.clone();
            }
        }

        let plan = self.analyzer.analyze(&spec)?;
        let artifacts = self.renderer.render(&plan)?;
        info!(
            "Prepared {} artifacts for {}",
            artifacts.len(),
            plan.name_prefix
        );

        Ok(Prepared {
            spec,
            defaulted: validated
                .defaults
                .iter()
                .map(|d| d.field.to_string())
                .collect(),
            plan,
            artifacts,
        })
    }

    /// Run the whole pipeline for `instruction`.
    pub async fn run(&self, instruction: &str, options: RunOptions) -> PipelineResult<DeploymentResult> {
        let prepared = self.prepare(instruction).await?;
        self.deploy(&prepared, options).await
    }

    /// Hand prepared artifacts to the orchestrator.
    ///
    /// The working directory is created here, after everything upstream
    /// has succeeded.
    pub async fn deploy(
        &self,
        prepared: &Prepared,
        options: RunOptions,
    ) -> PipelineResult<DeploymentResult> {
        let working_dir = options
            .working_dir
            .unwrap_or_else(|| self.fresh_working_dir());
        info!(
            "Deploying {} to {:?}{}",
            prepared.plan.name_prefix,
            working_dir,
            if options.dry_run { " (dry run)" } else { "" }
        );

        let result = self
            .orchestrator
            .deploy(&working_dir, &prepared.artifacts, options.dry_run)
            .await?;
        if let Some(error) = &result.error {
            warn!("Deployment failed during {}: {}", error.stage, error.message);
        }
        Ok(result)
    }

    /// Destroy whatever was deployed from `working_dir`.
    pub async fn destroy(&self, working_dir: &Path) -> PipelineResult<DeploymentResult> {
        info!("Destroying deployment in {:?}", working_dir);
        Ok(self.orchestrator.destroy(working_dir).await?)
    }

    fn fresh_working_dir(&self) -> PathBuf {
        self.working_root
            .join(format!("autodeploy-{}", uuid::Uuid::new_v4()))
    }
}
