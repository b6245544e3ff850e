//! Provisioning tool configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Container runtime used in container mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    #[default]
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Get the CLI command name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Where the tool binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Run the binary found on `PATH`.
    #[default]
    Local,
    /// Run the binary inside a container with the working directory mounted.
    Container,
}

/// Provisioning tool settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Tool binary name or path (local mode)
    pub binary: String,
    pub mode: ExecutionMode,
    /// Image used in container mode
    pub image: String,
    pub tag: String,
    pub runtime: ContainerRuntime,
    /// Container network, e.g. `host` to reach a local emulator
    pub network: Option<String>,
    /// Timeout in seconds for non-mutating commands (0 = no timeout)
    pub timeout_secs: u64,
    /// Extra environment passed to the tool, typically `TF_VAR_*` credentials
    pub env: BTreeMap<String, String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_string(),
            mode: ExecutionMode::Local,
            image: "hashicorp/terraform".to_string(),
            tag: "1.6".to_string(),
            runtime: ContainerRuntime::Docker,
            network: None,
            timeout_secs: 600, // 10 minutes
            env: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env: Vec<&String> = self.env.keys().collect();
        f.debug_struct("ToolConfig")
            .field("binary", &self.binary)
            .field("mode", &self.mode)
            .field("image", &self.full_image())
            .field("runtime", &self.runtime)
            .field("network", &self.network)
            .field("timeout_secs", &self.timeout_secs)
            .field("env", &env)
            .finish()
    }
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run inside a container using `runtime`.
    pub fn container(mut self, runtime: ContainerRuntime) -> Self {
        self.mode = ExecutionMode::Container;
        self.runtime = runtime;
        self
    }

    pub fn image(mut self, image: impl Into<String>, tag: impl Into<String>) -> Self {
        self.image = image.into();
        self.tag = tag.into();
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Pass `value` as the Terraform input variable `name`.
    pub fn tf_var(self, name: &str, value: impl Into<String>) -> Self {
        self.env(format!("TF_VAR_{}", name), value)
    }

    /// Get the full image name with tag.
    pub fn full_image(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}
