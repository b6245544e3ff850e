//! Requirement analysis: StructuredSpec to ResourcePlan.
//!
//! The analyzer is a pure function of the spec, the policy tables and the
//! backend selection. It performs no I/O and uses no clock or randomness, so
//! identical inputs always produce an identical plan.

use std::collections::BTreeMap;

use autodeploy_spec::{
    AlarmPlan, Backend, ComputeFamily, ComputePlan, DatabasePlan, DeploymentType, EncryptionPlan,
    Environment, FirewallRule, MonitoringPlan, ResourcePlan, ScalingPlan, SecurityLevel,
    SecurityPlan, SshAccess, StructuredSpec,
};
use tracing::{debug, info, warn};

use crate::bootstrap::bootstrap_script;
use crate::error::{PolicyError, PolicyResult};
use crate::network::{self, Topology};
use crate::tables::{ComputeEntry, PolicyTables, SecurityEntry};

/// Turns specs into resource plans using a fixed set of policy tables.
#[derive(Debug, Clone)]
pub struct Analyzer {
    tables: PolicyTables,
    backend: Backend,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::standard()
    }
}

impl Analyzer {
    pub fn new(tables: PolicyTables) -> Self {
        Self {
            tables,
            backend: Backend::Aws,
        }
    }

    /// Analyzer over the built-in tables targeting real AWS endpoints.
    pub fn standard() -> Self {
        Self::new(PolicyTables::standard())
    }

    /// Select the backend recorded in every plan.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn tables(&self) -> &PolicyTables {
        &self.tables
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Produce the resource plan for `spec`.
    pub fn analyze(&self, spec: &StructuredSpec) -> PolicyResult<ResourcePlan> {
        let compute_entry = self.compute_entry(spec)?;
        let family = compute_entry.family;

        let security_entry = self
            .tables
            .security_for(family, spec.environment, spec.security_level)
            .ok_or_else(|| PolicyError::MissingPolicy {
                table: "security".to_string(),
                key: format!("{}/{}/{}", family.as_str(), spec.environment, spec.security_level),
            })?;
        let scaling = self.scaling(spec)?;
        let monitoring = self.monitoring(spec, family)?;
        let database = self.database(spec)?;
        let network = self.network(spec, &scaling, database.is_some())?;
        let compute = self.compute(spec, compute_entry);
        let security = security_plan(security_entry, &compute, &network.vpc_cidr);
        let encryption = EncryptionPlan {
            at_rest: security_entry.encrypt_at_rest,
            in_transit: security_entry.encrypt_in_transit,
            customer_managed_key: security_entry.customer_managed_key,
            key_rotation: security_entry.customer_managed_key,
        };

        let name_prefix = format!(
            "autodeploy-{}-{}",
            spec.deployment_type.as_str().replace('_', "-"),
            spec.environment.short_name()
        );

        let plan = ResourcePlan {
            tags: tags(spec, &name_prefix),
            name_prefix,
            deployment_type: spec.deployment_type.clone(),
            framework: spec.framework.clone(),
            provider: spec.cloud_provider,
            region: spec.region.clone(),
            environment: spec.environment,
            security_level: spec.security_level,
            compute,
            database,
            network,
            security,
            encryption,
            scaling,
            monitoring,
            backend: self.backend.clone(),
        };

        info!(
            "Planned {} ({}) for {}: {} x{}..{}",
            plan.deployment_type,
            plan.framework,
            plan.environment,
            plan.compute.instance_class,
            plan.scaling.min_capacity,
            plan.scaling.max_capacity
        );
        Ok(plan)
    }

    fn compute_entry(&self, spec: &StructuredSpec) -> PolicyResult<&ComputeEntry> {
        if !spec.deployment_type.is_supported()
            || !self.tables.supports_deployment_type(&spec.deployment_type)
        {
            return Err(PolicyError::invalid_spec(
                "deployment_type",
                spec.deployment_type.as_str(),
            ));
        }

        self.tables
            .compute_for(&spec.deployment_type, &spec.framework, spec.environment)
            .ok_or_else(|| {
                // Distinguish a missing tier from an unserved framework
                let framework_served = Environment::ALL.iter().any(|env| {
                    self.tables
                        .compute_for(&spec.deployment_type, &spec.framework, *env)
                        .is_some()
                });
                if framework_served {
                    PolicyError::MissingPolicy {
                        table: "compute".to_string(),
                        key: format!(
                            "{}/{}/{}",
                            spec.deployment_type, spec.framework, spec.environment
                        ),
                    }
                } else {
                    PolicyError::invalid_spec("framework", spec.framework.as_str())
                }
            })
    }

    fn compute(&self, spec: &StructuredSpec, entry: &ComputeEntry) -> ComputePlan {
        let bootstrap_script = match entry.family {
            ComputeFamily::Vm => bootstrap_script(spec.framework.as_str(), entry.app_port),
            _ => String::new(),
        };
        debug!(
            "Compute entry {} / {} -> {}",
            entry.deployment_type, entry.framework, entry.instance_class
        );

        ComputePlan {
            family: entry.family,
            instance_class: entry.instance_class.clone(),
            burstable: entry.burstable,
            cpu_units: entry.cpu_units,
            memory_mb: entry.memory_mb,
            storage_gb: entry.storage_gb,
            runtime: entry.runtime.clone(),
            timeout_seconds: entry.timeout_seconds,
            app_port: entry.app_port,
            bootstrap_script,
        }
    }

    fn scaling(&self, spec: &StructuredSpec) -> PolicyResult<ScalingPlan> {
        let entry = self
            .tables
            .scaling_for(spec.scaling_requirements, spec.environment)
            .ok_or_else(|| PolicyError::MissingPolicy {
                table: "scaling".to_string(),
                key: format!("{}/{}", spec.scaling_requirements, spec.environment),
            })?;

        Ok(ScalingPlan {
            mode: entry.scaling,
            min_capacity: entry.min_capacity,
            max_capacity: entry.max_capacity,
            desired_capacity: entry.desired_capacity,
            zones: entry.zones,
            target_cpu_percent: entry.target_cpu_percent,
        })
    }

    fn monitoring(
        &self,
        spec: &StructuredSpec,
        family: ComputeFamily,
    ) -> PolicyResult<MonitoringPlan> {
        let entry = self
            .tables
            .monitoring_for(spec.environment)
            .ok_or_else(|| PolicyError::MissingPolicy {
                table: "monitoring".to_string(),
                key: spec.environment.to_string(),
            })?;

        let mut log_retention_days = entry.log_retention_days;
        if spec.security_level == SecurityLevel::Enterprise {
            log_retention_days = log_retention_days.max(self.tables.enterprise_log_retention_days);
        }

        Ok(MonitoringPlan {
            logs: entry.logs,
            metrics: entry.metrics,
            alerting: entry.alerting,
            log_retention_days,
            alarms: if entry.alerting { alarms(family) } else { Vec::new() },
            backups: entry.backups,
        })
    }

    fn database(&self, spec: &StructuredSpec) -> PolicyResult<Option<DatabasePlan>> {
        if !spec.database_required {
            return Ok(None);
        }
        if spec.deployment_type == DeploymentType::StaticSite {
            warn!("Static sites have no compute to attach a database to; ignoring database_required");
            return Ok(None);
        }

        let entry = self
            .tables
            .database_for(spec.environment)
            .ok_or_else(|| PolicyError::MissingPolicy {
                table: "database".to_string(),
                key: spec.environment.to_string(),
            })?;

        Ok(Some(DatabasePlan {
            engine: entry.engine.clone(),
            engine_version: entry.engine_version.clone(),
            instance_class: entry.instance_class.clone(),
            storage_gb: entry.storage_gb,
            multi_az: entry.multi_az,
            backup_retention_days: entry.backup_retention_days,
        }))
    }

    fn network(
        &self,
        spec: &StructuredSpec,
        scaling: &ScalingPlan,
        has_database: bool,
    ) -> PolicyResult<autodeploy_spec::NetworkPlan> {
        let topology = match spec.deployment_type {
            // Object storage needs no VPC
            DeploymentType::StaticSite => Topology {
                public_zones: 0,
                private_zones: 0,
                nat_gateway: false,
            },
            _ => {
                let isolated = has_database
                    || matches!(
                        spec.deployment_type,
                        DeploymentType::Container | DeploymentType::Serverless
                    );
                // Database subnet groups span at least two zones
                let private_zones = match (isolated, has_database) {
                    (false, _) => 0,
                    (true, true) => scaling.zones.max(2),
                    (true, false) => scaling.zones,
                };
                // Load balancers span at least two zones
                let public_zones = match spec.deployment_type {
                    DeploymentType::Container => scaling.zones.max(2),
                    _ => scaling.zones,
                };
                Topology {
                    public_zones,
                    private_zones,
                    nat_gateway: spec.environment != Environment::Development,
                }
            }
        };

        network::allocate(&self.tables.network, topology)
    }
}

fn security_plan(entry: &SecurityEntry, compute: &ComputePlan, vpc_cidr: &str) -> SecurityPlan {
    let mut ingress: Vec<FirewallRule> = entry
        .public_ports
        .iter()
        .map(|port| FirewallRule::tcp(*port, "0.0.0.0/0", public_port_description(*port)))
        .collect();

    if entry.expose_app_port && !entry.public_ports.contains(&compute.app_port) {
        ingress.push(FirewallRule::tcp(
            compute.app_port,
            "0.0.0.0/0",
            "Application port",
        ));
    }

    match entry.ssh {
        SshAccess::Open => ingress.push(FirewallRule::tcp(22, "0.0.0.0/0", "SSH")),
        SshAccess::VpcOnly => ingress.push(FirewallRule::tcp(22, vpc_cidr, "SSH from VPC")),
        SshAccess::Disabled => {}
    }

    SecurityPlan {
        ingress,
        egress: vec![FirewallRule::allow_all("0.0.0.0/0", "All outbound")],
        ssh_access: entry.ssh,
        iam_actions: entry.iam_actions.clone(),
    }
}

fn public_port_description(port: u16) -> String {
    match port {
        80 => "HTTP".to_string(),
        443 => "HTTPS".to_string(),
        other => format!("Port {}", other),
    }
}

fn alarms(family: ComputeFamily) -> Vec<AlarmPlan> {
    let alarm = |name: &str, metric: &str, namespace: &str, threshold| AlarmPlan {
        name: name.to_string(),
        metric: metric.to_string(),
        namespace: namespace.to_string(),
        threshold,
        comparison: "GreaterThanThreshold".to_string(),
    };

    match family {
        ComputeFamily::Vm => vec![
            alarm("high-cpu", "CPUUtilization", "AWS/EC2", 80),
            alarm("status-check", "StatusCheckFailed", "AWS/EC2", 0),
        ],
        ComputeFamily::Function => vec![
            alarm("errors", "Errors", "AWS/Lambda", 5),
            alarm("throttles", "Throttles", "AWS/Lambda", 0),
        ],
        ComputeFamily::ContainerTask => vec![
            alarm("high-cpu", "CPUUtilization", "AWS/ECS", 80),
            alarm("high-memory", "MemoryUtilization", "AWS/ECS", 85),
        ],
        ComputeFamily::ObjectStorage => vec![alarm("4xx-errors", "4xxErrors", "AWS/S3", 100)],
    }
}

fn tags(spec: &StructuredSpec, name_prefix: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("DeploymentType".to_string(), spec.deployment_type.to_string()),
        ("Environment".to_string(), spec.environment.to_string()),
        ("Framework".to_string(), spec.framework.to_string()),
        ("ManagedBy".to_string(), "autodeploy".to_string()),
        ("Name".to_string(), name_prefix.to_string()),
        ("SecurityLevel".to_string(), spec.security_level.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodeploy_spec::ScalingRequirement;

    #[test]
    fn test_name_prefix() {
        let plan = Analyzer::standard()
            .analyze(&StructuredSpec::new("x").with_environment(Environment::Production))
            .unwrap();
        assert_eq!(plan.name_prefix, "autodeploy-web-application-prod");
        assert_eq!(plan.tags.get("Environment").map(String::as_str), Some("production"));
    }

    #[test]
    fn test_basic_vm_exposes_app_port_and_open_ssh() {
        let plan = Analyzer::standard()
            .analyze(&StructuredSpec::new("x").with_security_level(SecurityLevel::Basic))
            .unwrap();
        let ports: Vec<u16> = plan.security.ingress.iter().map(|r| r.from_port).collect();
        assert_eq!(ports, vec![80, 443, 3000, 22]);
        assert_eq!(plan.security.ssh_access, SshAccess::Open);
    }

    #[test]
    fn test_standard_ssh_is_vpc_only() {
        let plan = Analyzer::standard().analyze(&StructuredSpec::new("x")).unwrap();
        let ssh = plan
            .security
            .ingress
            .iter()
            .find(|r| r.from_port == 22)
            .unwrap();
        assert_eq!(ssh.cidr, "10.0.0.0/16");
    }

    #[test]
    fn test_database_forces_two_private_zones() {
        let plan = Analyzer::standard()
            .analyze(&StructuredSpec::new("x").with_database(true))
            .unwrap();
        assert_eq!(plan.network.private_subnets.len(), 2);
        assert!(!plan.network.nat_gateway);
        assert!(plan.database.is_some());
    }

    #[test]
    fn test_high_availability_production() {
        let plan = Analyzer::standard()
            .analyze(
                &StructuredSpec::new("x")
                    .with_environment(Environment::Production)
                    .with_scaling(ScalingRequirement::HighAvailability),
            )
            .unwrap();
        assert_eq!(plan.scaling.min_capacity, 3);
        assert_eq!(plan.scaling.zones, 3);
        assert_eq!(plan.network.public_subnets.len(), 3);
    }

    #[test]
    fn test_container_load_balancer_spans_two_zones() {
        let plan = Analyzer::standard()
            .analyze(&StructuredSpec::new("x").with_deployment_type(DeploymentType::Container))
            .unwrap();
        assert_eq!(plan.scaling.zones, 1);
        assert_eq!(plan.network.public_subnets.len(), 2);
    }

    #[test]
    fn test_static_site_ignores_database() {
        let plan = Analyzer::standard()
            .analyze(
                &StructuredSpec::new("x")
                    .with_deployment_type(DeploymentType::StaticSite)
                    .with_framework("react")
                    .with_database(true),
            )
            .unwrap();
        assert!(plan.database.is_none());
        assert!(plan.network.public_subnets.is_empty());
        assert_eq!(plan.compute.family, ComputeFamily::ObjectStorage);
    }
}
