//! Concrete resource plan derived from a [`StructuredSpec`](crate::StructuredSpec).
//!
//! All collections are ordered so that serialising the same plan twice
//! yields identical bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    CloudProvider, DeploymentType, Environment, Framework, ScalingRequirement, SecurityLevel,
};

/// Family of compute resource backing the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeFamily {
    Vm,
    Function,
    ContainerTask,
    ObjectStorage,
}

impl ComputeFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeFamily::Vm => "vm",
            ComputeFamily::Function => "function",
            ComputeFamily::ContainerTask => "container_task",
            ComputeFamily::ObjectStorage => "object_storage",
        }
    }
}

/// Compute sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputePlan {
    pub family: ComputeFamily,
    /// Instance type, Lambda memory class, Fargate capacity provider or
    /// storage class depending on `family`.
    pub instance_class: String,
    pub burstable: bool,
    pub cpu_units: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    pub runtime: Option<String>,
    pub timeout_seconds: Option<u32>,
    pub app_port: u16,
    pub bootstrap_script: String,
}

/// Managed database sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePlan {
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub storage_gb: u32,
    pub multi_az: bool,
    pub backup_retention_days: u32,
}

/// A single subnet allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetPlan {
    pub cidr: String,
    /// Index into the region's availability zones.
    pub zone_index: u8,
}

/// Network topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlan {
    pub vpc_cidr: String,
    pub public_subnets: Vec<SubnetPlan>,
    pub private_subnets: Vec<SubnetPlan>,
    pub nat_gateway: bool,
}

/// Breadth of SSH access, ordered from closed to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshAccess {
    Disabled,
    VpcOnly,
    Open,
}

/// A firewall rule on the workload's security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub from_port: u16,
    pub to_port: u16,
    /// `tcp`, `udp` or `-1` for all protocols.
    pub protocol: String,
    pub cidr: String,
    pub description: String,
}

impl FirewallRule {
    pub fn tcp(port: u16, cidr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            from_port: port,
            to_port: port,
            protocol: "tcp".to_string(),
            cidr: cidr.into(),
            description: description.into(),
        }
    }

    pub fn allow_all(cidr: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            from_port: 0,
            to_port: 0,
            protocol: "-1".to_string(),
            cidr: cidr.into(),
            description: description.into(),
        }
    }
}

/// Access rules and IAM scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPlan {
    pub ingress: Vec<FirewallRule>,
    pub egress: Vec<FirewallRule>,
    pub ssh_access: SshAccess,
    pub iam_actions: Vec<String>,
}

/// Encryption settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionPlan {
    pub at_rest: bool,
    pub in_transit: bool,
    /// Use a dedicated KMS key instead of the provider-managed one.
    pub customer_managed_key: bool,
    pub key_rotation: bool,
}

/// Capacity bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingPlan {
    pub mode: ScalingRequirement,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub desired_capacity: u32,
    /// Number of availability zones the capacity is spread over.
    pub zones: u8,
    pub target_cpu_percent: u8,
}

/// A metric alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPlan {
    pub name: String,
    pub metric: String,
    pub namespace: String,
    pub threshold: u32,
    pub comparison: String,
}

/// Logging, metrics and alerting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringPlan {
    pub logs: bool,
    pub metrics: bool,
    pub alerting: bool,
    pub log_retention_days: u32,
    pub alarms: Vec<AlarmPlan>,
    pub backups: bool,
}

/// Where the provider sends API calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    /// Real provider endpoints.
    #[default]
    Aws,
    /// A local emulator (for example LocalStack) reachable at `endpoint`.
    LocalEmulation { endpoint: String },
}

impl Backend {
    pub fn local(endpoint: impl Into<String>) -> Self {
        Backend::LocalEmulation {
            endpoint: endpoint.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Backend::LocalEmulation { .. })
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Backend::Aws => None,
            Backend::LocalEmulation { endpoint } => Some(endpoint.as_str()),
        }
    }
}

/// Fully resolved infrastructure plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    pub name_prefix: String,
    pub deployment_type: DeploymentType,
    pub framework: Framework,
    pub provider: CloudProvider,
    pub region: String,
    pub environment: Environment,
    pub security_level: SecurityLevel,
    pub compute: ComputePlan,
    pub database: Option<DatabasePlan>,
    pub network: NetworkPlan,
    pub security: SecurityPlan,
    pub encryption: EncryptionPlan,
    pub scaling: ScalingPlan,
    pub monitoring: MonitoringPlan,
    pub tags: BTreeMap<String, String>,
    pub backend: Backend,
}

impl ResourcePlan {
    /// Minimum number of running instances.
    pub fn redundancy(&self) -> u32 {
        self.scaling.min_capacity
    }

    pub fn uses_private_subnets(&self) -> bool {
        !self.network.private_subnets.is_empty()
    }

    /// Render the plan as YAML for inspection.
    pub fn to_yaml(&self) -> crate::SpecResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
