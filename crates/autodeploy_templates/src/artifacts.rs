//! ResourcePlan to ArtifactSet rendering.

use autodeploy_spec::{ArtifactKind, ArtifactSet, ResourcePlan};
use tracing::{debug, info};

use crate::error::{TemplateError, TemplateResult};
use crate::family::{family_for, TemplateFamily};
use crate::hcl::{self, TfVariable};
use crate::renderer::{TemplateRenderer, Variables};
use crate::store::{TemplateStore, PARTIALS};

/// Renders resource plans into the fixed artifact set.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRenderer {
    store: TemplateStore,
    renderer: TemplateRenderer,
}

impl ArtifactRenderer {
    /// Create a renderer over the built-in templates.
    pub fn new() -> Self {
        Self::with_store(TemplateStore::builtin())
    }

    pub fn with_store(store: TemplateStore) -> Self {
        Self {
            store,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Render every artifact for `plan`.
    pub fn render(&self, plan: &ResourcePlan) -> TemplateResult<ArtifactSet> {
        let family = family_for(&plan.deployment_type).ok_or_else(|| TemplateError::NotFound {
            template: format!("{}/*", plan.deployment_type),
            deployment_type: plan.deployment_type.to_string(),
        })?;
        debug!("Rendering {} with template family '{}'", plan.name_prefix, family.name());

        let vars = self.variables(plan, family)?;

        let mut artifacts = ArtifactSet::new(plan.deployment_type.clone());
        for kind in ArtifactKind::ALL {
            let (key, template) = self
                .store
                .resolve(family.name(), kind.file_name())
                .ok_or_else(|| TemplateError::NotFound {
                    template: format!("{}/{}", family.name(), kind.file_name()),
                    deployment_type: plan.deployment_type.to_string(),
                })?;
            let content = self.renderer.render(&key, template, &vars)?;
            artifacts.insert(kind, content);
        }

        info!(
            "Rendered {} artifacts for {} ({})",
            artifacts.len(),
            plan.name_prefix,
            family.name()
        );
        Ok(artifacts)
    }

    fn variables(
        &self,
        plan: &ResourcePlan,
        family: &dyn TemplateFamily,
    ) -> TemplateResult<Variables> {
        let mut vars = Variables::new();

        let providers: Vec<String> = family
            .required_providers()
            .iter()
            .map(|p| {
                format!(
                    "    {} = {{\n      source  = {}\n      version = {}\n    }}",
                    p.name,
                    hcl::string(p.source),
                    hcl::string(p.version)
                )
            })
            .collect();

        let public_cidrs: Vec<&str> = plan.network.public_subnets.iter().map(|s| s.cidr.as_str()).collect();
        let private_cidrs: Vec<&str> = plan.network.private_subnets.iter().map(|s| s.cidr.as_str()).collect();
        let kms_key_ref = if plan.encryption.customer_managed_key {
            "aws_kms_key.main[0].arn"
        } else {
            "null"
        };

        vars.set("name_prefix", plan.name_prefix.clone())
            .set("environment", plan.environment.as_str())
            .set("deployment_type", plan.deployment_type.to_string())
            .set("framework", plan.framework.to_string())
            .set("family", family.name())
            .set("required_providers", providers.join("\n"))
            .set("provider_settings", hcl::provider_settings(&plan.backend))
            .set("common_tags", hcl::map_entries(&plan.tags, 4))
            .set("vpc_cidr", plan.network.vpc_cidr.clone())
            .set("public_subnet_cidrs", hcl::list(&public_cidrs))
            .set("private_subnet_cidrs", hcl::list(&private_cidrs))
            .set("nat_gateway_count", hcl::count(plan.network.nat_gateway))
            .set("instance_class", plan.compute.instance_class.clone())
            .set("encrypt_at_rest", hcl::boolean(plan.encryption.at_rest))
            .set("kms_key_count", hcl::count(plan.encryption.customer_managed_key))
            .set("key_rotation", hcl::boolean(plan.encryption.key_rotation))
            .set("kms_key_ref", kms_key_ref)
            .set("log_retention_days", plan.monitoring.log_retention_days.to_string())
            .set("alarms", hcl::alarms(&plan.monitoring.alarms))
            .set(
                "security_group_rules",
                hcl::security_group_rules(&plan.security.ingress, &plan.security.egress),
            )
            .set("iam_actions", hcl::list(&plan.security.iam_actions));

        family.placeholders(plan, &mut vars);

        let encryption = self.partial(plan, "encryption", &vars)?;
        vars.set("encryption_resources", encryption);

        let database = self.database_partial(plan, &vars)?;
        vars.set("database_outputs", database_outputs(plan))
            .set("database_resources", database);

        let mut declared = common_variables(plan);
        declared.extend(family.variables(plan));
        declared.extend(database_variables(plan));
        let blocks: Vec<String> = declared.iter().map(TfVariable::to_hcl).collect();
        vars.set("variables", blocks.join("\n\n"));

        Ok(vars)
    }

    fn database_partial(&self, plan: &ResourcePlan, vars: &Variables) -> TemplateResult<String> {
        let Some(database) = &plan.database else {
            return Ok(String::new());
        };

        let production = plan.environment == autodeploy_spec::Environment::Production;
        let mut db_vars = vars.clone();
        db_vars
            .set("db_engine", database.engine.clone())
            .set("db_port", database_port(&database.engine).to_string())
            .set("db_multi_az", hcl::boolean(database.multi_az))
            .set("db_backup_retention_days", database.backup_retention_days.to_string())
            .set("db_skip_final_snapshot", hcl::boolean(!production))
            .set("db_deletion_protection", hcl::boolean(production));

        self.partial(plan, "database", &db_vars)
    }

    fn partial(&self, plan: &ResourcePlan, name: &str, vars: &Variables) -> TemplateResult<String> {
        let key = format!("{}/{}", PARTIALS, name);
        let template = self.store.get(&key).ok_or_else(|| TemplateError::NotFound {
            template: key.clone(),
            deployment_type: plan.deployment_type.to_string(),
        })?;
        self.renderer.render(&key, template, vars)
    }
}

fn database_outputs(plan: &ResourcePlan) -> String {
    if plan.database.is_none() {
        return String::new();
    }
    [
        "",
        "output \"database_endpoint\" {",
        "  description = \"Connection endpoint of the database\"",
        "  value       = aws_db_instance.main.endpoint",
        "}",
        "",
        "output \"database_secret_arn\" {",
        "  value     = aws_db_instance.main.master_user_secret[0].secret_arn",
        "  sensitive = true",
        "}",
    ]
    .join("\n")
}

fn database_port(engine: &str) -> u16 {
    match engine {
        "mysql" | "mariadb" | "aurora-mysql" => 3306,
        "sqlserver-ex" | "sqlserver-se" | "sqlserver-ee" => 1433,
        _ => 5432,
    }
}

fn common_variables(plan: &ResourcePlan) -> Vec<TfVariable> {
    let endpoint_default = match plan.backend.endpoint() {
        Some(endpoint) => hcl::string(endpoint),
        None => "null".to_string(),
    };

    let credentials = |name: &str, description: &str| TfVariable {
        name: name.to_string(),
        kind: "string",
        description: description.to_string(),
        default: "null".to_string(),
        sensitive: true,
    };
    let access_key = credentials("aws_access_key", "AWS access key; null uses the default chain");
    let secret_key = credentials("aws_secret_key", "AWS secret key; null uses the default chain");

    vec![
        TfVariable::string("region", "AWS region", &plan.region),
        TfVariable::string("name_prefix", "Prefix for resource names", &plan.name_prefix),
        TfVariable::string("environment", "Deployment environment", plan.environment.as_str()),
        access_key,
        secret_key,
        TfVariable {
            name: "aws_endpoint_url".to_string(),
            kind: "string",
            description: "Endpoint override for a local emulator".to_string(),
            default: endpoint_default,
            sensitive: false,
        },
    ]
}

fn database_variables(plan: &ResourcePlan) -> Vec<TfVariable> {
    match &plan.database {
        None => Vec::new(),
        Some(db) => vec![
            TfVariable::string("db_instance_class", "Database instance class", &db.instance_class),
            TfVariable::string("db_engine_version", "Database engine version", &db.engine_version),
            TfVariable::number("db_allocated_storage", "Database storage in GiB", db.storage_gb),
        ],
    }
}
