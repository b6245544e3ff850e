//! Template families, one per deployment type.
//!
//! Every family renders the same fixed artifact set; a family only decides
//! which template texts are used and which family-specific values feed them.

use autodeploy_spec::{ComputeFamily, DeploymentType, Framework, ResourcePlan, ScalingRequirement};

use crate::hcl::{self, TfVariable};
use crate::renderer::Variables;

/// A Terraform provider required by a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderRequirement {
    pub name: &'static str,
    pub source: &'static str,
    pub version: &'static str,
}

pub const AWS_PROVIDER: ProviderRequirement = ProviderRequirement {
    name: "aws",
    source: "hashicorp/aws",
    version: "~> 5.0",
};

const ARCHIVE_PROVIDER: ProviderRequirement = ProviderRequirement {
    name: "archive",
    source: "hashicorp/archive",
    version: "~> 2.4",
};

/// Template family for one deployment type.
pub trait TemplateFamily: Send + Sync {
    /// Directory name of the family's templates.
    fn name(&self) -> &'static str;

    /// Compute family the templates provision.
    fn compute_family(&self) -> ComputeFamily;

    fn required_providers(&self) -> Vec<ProviderRequirement> {
        vec![AWS_PROVIDER]
    }

    /// Input variables declared in `variables.tf`, beyond the common ones.
    fn variables(&self, plan: &ResourcePlan) -> Vec<TfVariable>;

    /// Family-specific placeholder values.
    fn placeholders(&self, plan: &ResourcePlan, vars: &mut Variables);
}

/// Select the family for a deployment type.
pub fn family_for(deployment_type: &DeploymentType) -> Option<&'static dyn TemplateFamily> {
    static VM: VmFamily = VmFamily;
    static SERVERLESS: ServerlessFamily = ServerlessFamily;
    static CONTAINER: ContainerFamily = ContainerFamily;
    static STATIC: StaticFamily = StaticFamily;

    match deployment_type {
        DeploymentType::WebApplication => Some(&VM),
        DeploymentType::Serverless => Some(&SERVERLESS),
        DeploymentType::Container => Some(&CONTAINER),
        DeploymentType::StaticSite => Some(&STATIC),
        DeploymentType::Unsupported(_) => None,
    }
}

fn autoscaling_enabled(plan: &ResourcePlan) -> bool {
    plan.scaling.mode != ScalingRequirement::Manual
        && plan.scaling.max_capacity > plan.scaling.min_capacity
}

fn capacity_variables(plan: &ResourcePlan) -> Vec<TfVariable> {
    vec![
        TfVariable::number("min_capacity", "Minimum number of instances", plan.scaling.min_capacity),
        TfVariable::number("max_capacity", "Maximum number of instances", plan.scaling.max_capacity),
        TfVariable::number(
            "desired_capacity",
            "Desired number of instances",
            plan.scaling.desired_capacity,
        ),
        TfVariable::number("app_port", "Port the application listens on", plan.compute.app_port),
    ]
}

/// EC2 instances behind an autoscaling group.
#[derive(Debug, Default)]
pub struct VmFamily;

impl TemplateFamily for VmFamily {
    fn name(&self) -> &'static str {
        "vm"
    }

    fn compute_family(&self) -> ComputeFamily {
        ComputeFamily::Vm
    }

    fn variables(&self, plan: &ResourcePlan) -> Vec<TfVariable> {
        let mut vars = vec![
            TfVariable::string("instance_type", "EC2 instance type", &plan.compute.instance_class),
            TfVariable::number("root_volume_size", "Root volume size in GiB", plan.compute.storage_gb),
        ];
        vars.extend(capacity_variables(plan));
        vars
    }

    fn placeholders(&self, plan: &ResourcePlan, vars: &mut Variables) {
        vars.set("user_data", hcl::heredoc(&plan.compute.bootstrap_script))
            .set("autoscaling_count", hcl::count(autoscaling_enabled(plan)))
            .set("target_cpu_percent", plan.scaling.target_cpu_percent.to_string())
            .set("burstable", hcl::boolean(plan.compute.burstable));
    }
}

/// Lambda function with a public function URL.
#[derive(Debug, Default)]
pub struct ServerlessFamily;

impl ServerlessFamily {
    /// Handler, file name and placeholder source for a runtime.
    fn handler(runtime: &str) -> (&'static str, &'static str, &'static str) {
        if runtime.starts_with("nodejs") {
            (
                "index.handler",
                "index.js",
                "exports.handler = async () => ({ statusCode: 200, body: \"ok\" });",
            )
        } else if runtime.starts_with("python") {
            (
                "main.handler",
                "main.py",
                "def handler(event, context):\n    return {\"statusCode\": 200, \"body\": \"ok\"}",
            )
        } else if runtime.starts_with("java") {
            ("example.Handler::handleRequest", "README", "Replace with the application jar.")
        } else {
            ("bootstrap", "bootstrap", "#!/bin/sh\necho ok")
        }
    }
}

impl TemplateFamily for ServerlessFamily {
    fn name(&self) -> &'static str {
        "serverless"
    }

    fn compute_family(&self) -> ComputeFamily {
        ComputeFamily::Function
    }

    fn required_providers(&self) -> Vec<ProviderRequirement> {
        vec![AWS_PROVIDER, ARCHIVE_PROVIDER]
    }

    fn variables(&self, plan: &ResourcePlan) -> Vec<TfVariable> {
        let runtime = plan.compute.runtime.as_deref().unwrap_or("provided.al2023");
        vec![
            TfVariable::string("runtime", "Lambda runtime", runtime),
            TfVariable::number("memory_size", "Function memory in MB", plan.compute.memory_mb),
            TfVariable::number(
                "timeout",
                "Function timeout in seconds",
                plan.compute.timeout_seconds.unwrap_or(30),
            ),
            TfVariable::string(
                "package_path",
                "Deployment package; empty uses a generated placeholder",
                "",
            ),
        ]
    }

    fn placeholders(&self, plan: &ResourcePlan, vars: &mut Variables) {
        let runtime = plan.compute.runtime.as_deref().unwrap_or("provided.al2023");
        let (handler, file, source) = Self::handler(runtime);
        vars.set("handler", handler)
            .set("handler_file", file)
            .set("handler_source", hcl::heredoc(source));
    }
}

/// Fargate service behind an application load balancer.
#[derive(Debug, Default)]
pub struct ContainerFamily;

impl ContainerFamily {
    fn default_image(framework: &Framework) -> &'static str {
        match framework.as_str() {
            Framework::NODEJS => "public.ecr.aws/docker/library/node:18-alpine",
            Framework::PYTHON => "public.ecr.aws/docker/library/python:3.11-slim",
            Framework::JAVA => "public.ecr.aws/docker/library/eclipse-temurin:17-jre",
            Framework::GO => "public.ecr.aws/docker/library/golang:1.21-alpine",
            _ => "public.ecr.aws/nginx/nginx:stable",
        }
    }
}

impl TemplateFamily for ContainerFamily {
    fn name(&self) -> &'static str {
        "container"
    }

    fn compute_family(&self) -> ComputeFamily {
        ComputeFamily::ContainerTask
    }

    fn variables(&self, plan: &ResourcePlan) -> Vec<TfVariable> {
        let mut vars = vec![
            TfVariable::string(
                "container_image",
                "Container image to run",
                Self::default_image(&plan.framework),
            ),
            TfVariable::number("task_cpu", "Task CPU units", plan.compute.cpu_units),
            TfVariable::number("task_memory", "Task memory in MB", plan.compute.memory_mb),
            TfVariable::number(
                "ephemeral_storage",
                "Task ephemeral storage in GiB",
                plan.compute.storage_gb,
            ),
        ];
        vars.extend(capacity_variables(plan));
        vars
    }

    fn placeholders(&self, plan: &ResourcePlan, vars: &mut Variables) {
        // Without a NAT gateway tasks need a public address to pull images
        let (subnets, public_ip) = if plan.network.nat_gateway {
            ("aws_subnet.private[*].id", false)
        } else {
            ("aws_subnet.public[*].id", true)
        };
        vars.set("task_subnets", subnets)
            .set("assign_public_ip", hcl::boolean(public_ip))
            .set("capacity_provider", plan.compute.instance_class.clone())
            .set("autoscaling_count", hcl::count(autoscaling_enabled(plan)))
            .set("target_cpu_percent", plan.scaling.target_cpu_percent.to_string());
    }
}

/// S3 static website.
#[derive(Debug, Default)]
pub struct StaticFamily;

impl TemplateFamily for StaticFamily {
    fn name(&self) -> &'static str {
        "static"
    }

    fn compute_family(&self) -> ComputeFamily {
        ComputeFamily::ObjectStorage
    }

    fn variables(&self, plan: &ResourcePlan) -> Vec<TfVariable> {
        vec![
            TfVariable::string("index_document", "Website index document", "index.html"),
            TfVariable::string("error_document", "Website error document", "error.html"),
            TfVariable::string("storage_class", "Storage class for site objects", &plan.compute.instance_class),
        ]
    }

    fn placeholders(&self, plan: &ResourcePlan, vars: &mut Variables) {
        vars.set("versioning_status", if plan.monitoring.backups { "Enabled" } else { "Suspended" })
            .set("sse_algorithm", if plan.encryption.customer_managed_key { "aws:kms" } else { "AES256" })
            .set("deny_insecure_transport_count", hcl::count(plan.encryption.in_transit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_covers_supported_types() {
        for deployment_type in DeploymentType::SUPPORTED {
            assert!(family_for(&deployment_type).is_some());
        }
        assert!(family_for(&DeploymentType::Unsupported("mainframe".into())).is_none());
    }

    #[test]
    fn test_family_names() {
        let names: Vec<_> = DeploymentType::SUPPORTED
            .iter()
            .filter_map(family_for)
            .map(|f| f.name())
            .collect();
        assert_eq!(names, vec!["vm", "serverless", "container", "static"]);
    }

    #[test]
    fn test_serverless_handlers() {
        assert_eq!(ServerlessFamily::handler("nodejs18.x").0, "index.handler");
        assert_eq!(ServerlessFamily::handler("python3.11").1, "main.py");
        assert_eq!(ServerlessFamily::handler("provided.al2023").0, "bootstrap");
    }
}
