//! Environment policy tables.
//!
//! Tables are plain data: the analyzer only looks entries up. The built-in
//! set comes from [`PolicyTables::standard`]; alternatives can be loaded from
//! YAML.

use std::path::Path;

use autodeploy_spec::{
    ComputeFamily, DeploymentType, Environment, Framework, ScalingRequirement, SecurityLevel,
    SshAccess,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};

/// Framework key matching any framework.
pub const ANY_FRAMEWORK: &str = "*";

/// Compute sizing for one (deployment type, framework, environment) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeEntry {
    pub deployment_type: DeploymentType,
    /// Canonical framework name or [`ANY_FRAMEWORK`].
    pub framework: String,
    pub environment: Environment,
    pub family: ComputeFamily,
    pub instance_class: String,
    pub burstable: bool,
    #[serde(default)]
    pub cpu_units: u32,
    #[serde(default)]
    pub memory_mb: u32,
    #[serde(default)]
    pub storage_gb: u32,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    #[serde(default)]
    pub app_port: u16,
}

/// Access and encryption defaults for one (resource, environment, level) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEntry {
    pub resource: ComputeFamily,
    pub environment: Environment,
    pub level: SecurityLevel,
    pub ssh: SshAccess,
    /// Ports reachable from anywhere.
    pub public_ports: Vec<u16>,
    /// Whether the application port itself is exposed publicly.
    pub expose_app_port: bool,
    pub iam_actions: Vec<String>,
    pub encrypt_at_rest: bool,
    pub encrypt_in_transit: bool,
    pub customer_managed_key: bool,
}

/// Capacity bounds for one (scaling requirement, environment) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingEntry {
    pub scaling: ScalingRequirement,
    pub environment: Environment,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub desired_capacity: u32,
    pub zones: u8,
    pub target_cpu_percent: u8,
}

/// Observability defaults for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringEntry {
    pub environment: Environment,
    pub logs: bool,
    pub metrics: bool,
    pub alerting: bool,
    pub log_retention_days: u32,
    pub backups: bool,
}

/// Managed database sizing for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub environment: Environment,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub storage_gb: u32,
    pub multi_az: bool,
    pub backup_retention_days: u32,
}

/// Fixed CIDR allocation scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPolicy {
    pub vpc_cidr: String,
    pub subnet_prefix: u8,
    /// Index of the first public subnet inside the VPC block.
    pub public_offset: u32,
    /// Index of the first private subnet inside the VPC block.
    pub private_offset: u32,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            vpc_cidr: "10.0.0.0/16".to_string(),
            subnet_prefix: 24,
            public_offset: 1,
            private_offset: 101,
        }
    }
}

/// Complete set of policy tables consulted by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTables {
    pub name: String,
    #[serde(default)]
    pub network: NetworkPolicy,
    pub compute: Vec<ComputeEntry>,
    pub security: Vec<SecurityEntry>,
    pub scaling: Vec<ScalingEntry>,
    pub monitoring: Vec<MonitoringEntry>,
    pub database: Vec<DatabaseEntry>,
    /// Log retention floor applied at the enterprise security level.
    #[serde(default = "default_enterprise_retention")]
    pub enterprise_log_retention_days: u32,
}

fn default_enterprise_retention() -> u32 {
    365
}

impl Default for PolicyTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl PolicyTables {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            network: NetworkPolicy::default(),
            compute: Vec::new(),
            security: Vec::new(),
            scaling: Vec::new(),
            monitoring: Vec::new(),
            database: Vec::new(),
            enterprise_log_retention_days: default_enterprise_retention(),
        }
    }

    /// Create the standard policy tables.
    pub fn standard() -> Self {
        let mut tables = Self::empty("standard");
        tables.compute = standard_compute();
        tables.security = standard_security();
        tables.scaling = standard_scaling();
        tables.monitoring = standard_monitoring();
        tables.database = standard_database();
        tables
    }

    /// Load tables from a YAML document.
    pub fn from_yaml(content: &str) -> PolicyResult<Self> {
        let tables: PolicyTables = serde_yaml::from_str(content)?;
        tables.check()?;
        Ok(tables)
    }

    /// Load tables from a YAML file.
    pub fn load(path: &Path) -> PolicyResult<Self> {
        debug!("Loading policy tables from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> PolicyResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject tables the analyzer could never use consistently.
    pub fn check(&self) -> PolicyResult<()> {
        if self.network.subnet_prefix > 28 {
            return Err(PolicyError::InvalidConfiguration(format!(
                "subnet prefix /{} is too small for a subnet",
                self.network.subnet_prefix
            )));
        }
        for entry in &self.scaling {
            if entry.min_capacity > entry.max_capacity
                || entry.desired_capacity < entry.min_capacity
                || entry.desired_capacity > entry.max_capacity
            {
                return Err(PolicyError::InvalidConfiguration(format!(
                    "scaling entry {}/{} has inconsistent bounds {}..{} (desired {})",
                    entry.scaling,
                    entry.environment,
                    entry.min_capacity,
                    entry.max_capacity,
                    entry.desired_capacity
                )));
            }
            if entry.zones == 0 {
                return Err(PolicyError::InvalidConfiguration(format!(
                    "scaling entry {}/{} spans zero zones",
                    entry.scaling, entry.environment
                )));
            }
        }
        Ok(())
    }

    /// Find compute sizing, preferring an exact framework match over `*`.
    pub fn compute_for(
        &self,
        deployment_type: &DeploymentType,
        framework: &Framework,
        environment: Environment,
    ) -> Option<&ComputeEntry> {
        let lookup = |key: &str| {
            self.compute.iter().find(|e| {
                &e.deployment_type == deployment_type
                    && e.environment == environment
                    && e.framework == key
            })
        };
        lookup(framework.as_str()).or_else(|| lookup(ANY_FRAMEWORK))
    }

    /// True when any compute entry serves `deployment_type`.
    pub fn supports_deployment_type(&self, deployment_type: &DeploymentType) -> bool {
        self.compute
            .iter()
            .any(|e| &e.deployment_type == deployment_type)
    }

    pub fn security_for(
        &self,
        resource: ComputeFamily,
        environment: Environment,
        level: SecurityLevel,
    ) -> Option<&SecurityEntry> {
        self.security
            .iter()
            .find(|e| e.resource == resource && e.environment == environment && e.level == level)
    }

    pub fn scaling_for(
        &self,
        scaling: ScalingRequirement,
        environment: Environment,
    ) -> Option<&ScalingEntry> {
        self.scaling
            .iter()
            .find(|e| e.scaling == scaling && e.environment == environment)
    }

    pub fn monitoring_for(&self, environment: Environment) -> Option<&MonitoringEntry> {
        self.monitoring.iter().find(|e| e.environment == environment)
    }

    pub fn database_for(&self, environment: Environment) -> Option<&DatabaseEntry> {
        self.database.iter().find(|e| e.environment == environment)
    }
}

/// Storage multiplier per tier, in tenths.
fn storage_tenths(environment: Environment) -> u32 {
    match environment {
        Environment::Development => 10,
        Environment::Staging => 15,
        Environment::Production => 20,
    }
}

fn app_port(framework: &str) -> u16 {
    match framework {
        Framework::NODEJS => 3000,
        Framework::PYTHON => 8000,
        Framework::JAVA | Framework::GO => 8080,
        _ => 80,
    }
}

fn vm_entry(framework: &str, environment: Environment) -> ComputeEntry {
    // Java and Docker hosts get one size up, static hosts one size down
    let (instance_class, burstable) = match (environment, framework) {
        (Environment::Development, Framework::STATIC) => ("t3.nano", true),
        (Environment::Development, Framework::JAVA | Framework::DOCKER) => ("t3.small", true),
        (Environment::Development, _) => ("t3.micro", true),
        (Environment::Staging, Framework::STATIC) => ("t3.micro", true),
        (Environment::Staging, Framework::JAVA | Framework::DOCKER) => ("t3.medium", true),
        (Environment::Staging, _) => ("t3.small", true),
        (Environment::Production, Framework::JAVA | Framework::DOCKER) => ("m6i.xlarge", false),
        (Environment::Production, _) => ("m6i.large", false),
    };
    let base_storage = match framework {
        Framework::STATIC => 10,
        Framework::JAVA | Framework::DOCKER => 30,
        _ => 20,
    };

    ComputeEntry {
        deployment_type: DeploymentType::WebApplication,
        framework: framework.to_string(),
        environment,
        family: ComputeFamily::Vm,
        instance_class: instance_class.to_string(),
        burstable,
        cpu_units: 0,
        memory_mb: 0,
        storage_gb: base_storage * storage_tenths(environment) / 10,
        runtime: None,
        timeout_seconds: None,
        app_port: app_port(framework),
    }
}

fn function_entry(framework: &str, environment: Environment) -> ComputeEntry {
    let runtime = match framework {
        Framework::NODEJS => "nodejs18.x",
        Framework::PYTHON => "python3.11",
        Framework::JAVA => "java17",
        _ => "provided.al2023",
    };
    let memory_mb = match environment {
        Environment::Development => 512,
        Environment::Staging => 1024,
        Environment::Production => 1536,
    };

    ComputeEntry {
        deployment_type: DeploymentType::Serverless,
        framework: framework.to_string(),
        environment,
        family: ComputeFamily::Function,
        instance_class: "lambda".to_string(),
        burstable: false,
        cpu_units: 0,
        memory_mb,
        storage_gb: 0,
        runtime: Some(runtime.to_string()),
        timeout_seconds: Some(30),
        app_port: 443,
    }
}

fn container_entry(framework: &str, environment: Environment) -> ComputeEntry {
    let (capacity, burstable, cpu_units, memory_mb) = match environment {
        Environment::Development => ("FARGATE_SPOT", true, 256, 512),
        Environment::Staging => ("FARGATE", false, 512, 1024),
        Environment::Production => ("FARGATE", false, 1024, 2048),
    };

    ComputeEntry {
        deployment_type: DeploymentType::Container,
        framework: framework.to_string(),
        environment,
        family: ComputeFamily::ContainerTask,
        instance_class: capacity.to_string(),
        burstable,
        cpu_units,
        memory_mb,
        storage_gb: 21,
        runtime: None,
        timeout_seconds: None,
        app_port: app_port(framework),
    }
}

fn static_entry(environment: Environment) -> ComputeEntry {
    ComputeEntry {
        deployment_type: DeploymentType::StaticSite,
        framework: ANY_FRAMEWORK.to_string(),
        environment,
        family: ComputeFamily::ObjectStorage,
        instance_class: "STANDARD".to_string(),
        burstable: false,
        cpu_units: 0,
        memory_mb: 0,
        storage_gb: 10 * storage_tenths(environment) / 10,
        runtime: None,
        timeout_seconds: None,
        app_port: 80,
    }
}

fn standard_compute() -> Vec<ComputeEntry> {
    let mut entries = Vec::new();
    for environment in Environment::ALL {
        for framework in [
            Framework::NODEJS,
            Framework::PYTHON,
            Framework::JAVA,
            Framework::GO,
            Framework::DOCKER,
        ] {
            entries.push(vm_entry(framework, environment));
            entries.push(container_entry(framework, environment));
        }
        entries.push(vm_entry(Framework::STATIC, environment));
        for framework in [Framework::NODEJS, Framework::PYTHON, Framework::JAVA, Framework::GO] {
            entries.push(function_entry(framework, environment));
        }
        entries.push(static_entry(environment));
    }
    entries
}

fn actions(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| a.to_string()).collect()
}

fn iam_actions(resource: ComputeFamily, level: SecurityLevel) -> Vec<String> {
    use SecurityLevel::*;
    match (resource, level) {
        (ComputeFamily::Vm, Basic) => actions(&[
            "cloudwatch:*",
            "ec2:Describe*",
            "kms:Decrypt",
            "logs:*",
            "s3:*",
            "ssm:*",
            "sts:GetCallerIdentity",
        ]),
        (ComputeFamily::Vm, Standard) => actions(&[
            "cloudwatch:PutMetricData",
            "logs:CreateLogStream",
            "logs:PutLogEvents",
            "s3:GetObject",
            "s3:PutObject",
            "ssm:GetParameter",
        ]),
        (ComputeFamily::Vm, High) => actions(&[
            "logs:CreateLogStream",
            "logs:PutLogEvents",
            "s3:GetObject",
            "ssm:GetParameter",
        ]),
        (ComputeFamily::Vm, Enterprise) => {
            actions(&["logs:CreateLogStream", "logs:PutLogEvents"])
        }
        (ComputeFamily::Function, Basic) => {
            actions(&["dynamodb:*", "logs:*", "s3:*", "sns:Publish", "sqs:*"])
        }
        (ComputeFamily::Function, Standard) => actions(&[
            "logs:CreateLogGroup",
            "logs:CreateLogStream",
            "logs:PutLogEvents",
            "s3:GetObject",
        ]),
        (ComputeFamily::Function, High | Enterprise) => {
            actions(&["logs:CreateLogStream", "logs:PutLogEvents"])
        }
        (ComputeFamily::ContainerTask, Basic) => actions(&[
            "ecr:*",
            "logs:*",
            "s3:*",
            "secretsmanager:GetSecretValue",
            "ssm:GetParameters",
            "sts:AssumeRole",
        ]),
        (ComputeFamily::ContainerTask, _) => actions(&[
            "ecr:BatchGetImage",
            "ecr:GetAuthorizationToken",
            "ecr:GetDownloadUrlForLayer",
            "logs:CreateLogStream",
            "logs:PutLogEvents",
        ]),
        (ComputeFamily::ObjectStorage, Basic) => actions(&["s3:GetObject", "s3:ListBucket"]),
        (ComputeFamily::ObjectStorage, _) => actions(&["s3:GetObject"]),
    }
}

fn ssh_access(resource: ComputeFamily, environment: Environment, level: SecurityLevel) -> SshAccess {
    if resource != ComputeFamily::Vm {
        return SshAccess::Disabled;
    }
    let by_level = match level {
        SecurityLevel::Basic => SshAccess::Open,
        SecurityLevel::Standard => SshAccess::VpcOnly,
        SecurityLevel::High | SecurityLevel::Enterprise => SshAccess::Disabled,
    };
    // Production narrows SSH by one step
    match (environment, by_level) {
        (Environment::Production, SshAccess::Open) => SshAccess::VpcOnly,
        (Environment::Production, SshAccess::VpcOnly) => SshAccess::Disabled,
        (_, access) => access,
    }
}

fn public_ports(resource: ComputeFamily, level: SecurityLevel) -> (Vec<u16>, bool) {
    match (resource, level) {
        (ComputeFamily::Function, _) => (Vec::new(), false),
        (_, SecurityLevel::Basic) => (vec![80, 443], resource != ComputeFamily::ObjectStorage),
        (_, SecurityLevel::Standard) => (vec![80, 443], false),
        (_, SecurityLevel::High | SecurityLevel::Enterprise) => (vec![443], false),
    }
}

fn standard_security() -> Vec<SecurityEntry> {
    let mut entries = Vec::new();
    for resource in [
        ComputeFamily::Vm,
        ComputeFamily::Function,
        ComputeFamily::ContainerTask,
        ComputeFamily::ObjectStorage,
    ] {
        for environment in Environment::ALL {
            for level in SecurityLevel::ALL {
                let (ports, expose_app_port) = public_ports(resource, level);
                entries.push(SecurityEntry {
                    resource,
                    environment,
                    level,
                    ssh: ssh_access(resource, environment, level),
                    public_ports: ports,
                    expose_app_port,
                    iam_actions: iam_actions(resource, level),
                    encrypt_at_rest: true,
                    encrypt_in_transit: true,
                    customer_managed_key: level >= SecurityLevel::High
                        || environment == Environment::Production,
                });
            }
        }
    }
    entries
}

fn scaling(
    scaling: ScalingRequirement,
    environment: Environment,
    bounds: (u32, u32, u32),
    zones: u8,
) -> ScalingEntry {
    ScalingEntry {
        scaling,
        environment,
        min_capacity: bounds.0,
        max_capacity: bounds.1,
        desired_capacity: bounds.2,
        zones,
        target_cpu_percent: if environment == Environment::Production { 60 } else { 70 },
    }
}

fn standard_scaling() -> Vec<ScalingEntry> {
    use Environment::*;
    use ScalingRequirement::*;
    vec![
        // Fixed capacity; production keeps a redundancy floor of two
        scaling(Manual, Development, (1, 1, 1), 1),
        scaling(Manual, Staging, (1, 1, 1), 1),
        scaling(Manual, Production, (2, 2, 2), 2),
        scaling(Auto, Development, (1, 2, 1), 1),
        scaling(Auto, Staging, (1, 4, 1), 2),
        scaling(Auto, Production, (2, 8, 2), 2),
        scaling(HighAvailability, Development, (2, 4, 2), 2),
        scaling(HighAvailability, Staging, (2, 6, 2), 2),
        scaling(HighAvailability, Production, (3, 9, 3), 3),
    ]
}

fn standard_monitoring() -> Vec<MonitoringEntry> {
    vec![
        MonitoringEntry {
            environment: Environment::Development,
            logs: true,
            metrics: false,
            alerting: false,
            log_retention_days: 7,
            backups: false,
        },
        MonitoringEntry {
            environment: Environment::Staging,
            logs: true,
            metrics: true,
            alerting: false,
            log_retention_days: 30,
            backups: true,
        },
        MonitoringEntry {
            environment: Environment::Production,
            logs: true,
            metrics: true,
            alerting: true,
            log_retention_days: 90,
            backups: true,
        },
    ]
}

fn standard_database() -> Vec<DatabaseEntry> {
    let entry = |environment, instance_class: &str, storage_gb, multi_az, retention| DatabaseEntry {
        environment,
        engine: "postgres".to_string(),
        engine_version: "15".to_string(),
        instance_class: instance_class.to_string(),
        storage_gb,
        multi_az,
        backup_retention_days: retention,
    };
    vec![
        entry(Environment::Development, "db.t3.micro", 20, false, 1),
        entry(Environment::Staging, "db.t3.medium", 50, false, 7),
        entry(Environment::Production, "db.m6i.large", 100, true, 30),
    ]
}
