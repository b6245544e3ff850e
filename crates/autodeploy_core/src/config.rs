//! Deployment configuration.
//!
//! Loaded from a TOML file, then overlaid with environment variables by
//! [`DeployConfig::with_env_overrides`]. Only the CLI reads the process
//! environment; the pipeline receives a finished value.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use autodeploy_interpreter::{OracleConfig, OracleProvider};
use autodeploy_runner::ToolConfig;
use autodeploy_spec::is_valid_region;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "autodeploy.toml";

/// Credentials used against a local emulator when none are configured.
const EMULATOR_CREDENTIAL: &str = "test";

/// Provisioning section: the tool settings plus orchestration knobs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    #[serde(flatten)]
    pub tool: ToolConfig,
    /// Wait before the single destroy retry
    pub destroy_backoff_ms: u64,
    /// Terraform input variables passed as `TF_VAR_<name>`
    pub credentials: BTreeMap<String, String>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            destroy_backoff_ms: 5_000,
            credentials: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let credentials: Vec<&String> = self.credentials.keys().collect();
        f.debug_struct("ProvisioningConfig")
            .field("tool", &self.tool)
            .field("destroy_backoff_ms", &self.destroy_backoff_ms)
            .field("credentials", &credentials)
            .finish()
    }
}

/// Complete configuration for a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub oracle: OracleConfig,
    pub provisioning: ProvisioningConfig,
    /// Redirects every provider call to a local emulator
    pub endpoint_override: Option<String>,
    /// Parent directory of generated working directories
    pub working_root: PathBuf,
    /// Region used when the instruction does not name one
    pub default_region: Option<String>,
    /// YAML file replacing the built-in policy tables
    pub policy_file: Option<PathBuf>,
    /// Directory of template overrides
    pub template_dir: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            provisioning: ProvisioningConfig::default(),
            endpoint_override: None,
            working_root: PathBuf::from("deployments"),
            default_region: None,
            policy_file: None,
            template_dir: None,
        }
    }
}

impl DeployConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> PipelineResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` (or `autodeploy.toml` if present), apply the
    /// environment on top and [`check`](Self::check) the result.
    pub fn from_env(path: Option<&Path>) -> PipelineResult<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::load(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        let config = config.with_env_overrides();
        config.check()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`, ignoring empty values.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // The configured provider's key wins; otherwise take whichever key exists
        let configured = self.oracle.provider;
        if let Some(key) = get(configured.api_key_env()) {
            self.oracle.api_key = Some(key);
        } else if self.oracle.api_key.is_none() {
            for provider in [OracleProvider::OpenAI, OracleProvider::Anthropic] {
                if let Some(key) = get(provider.api_key_env()) {
                    self.oracle.provider = provider;
                    self.oracle.api_key = Some(key);
                    break;
                }
            }
        }

        if let Some(model) = get("AUTODEPLOY_MODEL") {
            self.oracle.model = Some(model);
        }
        if let Some(endpoint) = get("AUTODEPLOY_ENDPOINT_URL") {
            self.endpoint_override = Some(endpoint);
        }
        if let Some(root) = get("AUTODEPLOY_WORKDIR") {
            self.working_root = PathBuf::from(root);
        }
        if let Some(region) = get("AWS_REGION") {
            self.default_region = Some(region);
        }
        if let Some(key) = get("AWS_ACCESS_KEY_ID") {
            self.provisioning
                .credentials
                .insert("aws_access_key".to_string(), key);
        }
        if let Some(secret) = get("AWS_SECRET_ACCESS_KEY") {
            self.provisioning
                .credentials
                .insert("aws_secret_key".to_string(), secret);
        }

        self
    }

    /// Tool settings with credentials attached as `TF_VAR_*`.
    pub fn tool_config(&self) -> ToolConfig {
        let mut credentials = self.provisioning.credentials.clone();
        if self.endpoint_override.is_some() {
            for name in ["aws_access_key", "aws_secret_key"] {
                credentials
                    .entry(name.to_string())
                    .or_insert_with(|| EMULATOR_CREDENTIAL.to_string());
            }
        }

        credentials
            .iter()
            .fold(self.provisioning.tool.clone(), |tool, (name, value)| {
                tool.tf_var(name, value.clone())
            })
    }

    pub fn destroy_backoff(&self) -> Duration {
        Duration::from_millis(self.provisioning.destroy_backoff_ms)
    }

    /// Reject values that cannot work before anything runs.
    pub fn check(&self) -> PipelineResult<()> {
        if self.oracle.max_attempts == 0 {
            return Err(PipelineError::Config(
                "oracle.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.provisioning.tool.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "provisioning.timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(region) = &self.default_region {
            if !is_valid_region(region) {
                return Err(PipelineError::Config(format!(
                    "default_region '{}' is not a valid region name",
                    region
                )));
            }
        }
        if let Some(endpoint) = &self.endpoint_override {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(PipelineError::Config(format!(
                    "endpoint_override must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}
