//! HCL fragment builders shared by the template families.

use autodeploy_spec::{AlarmPlan, Backend, FirewallRule};

/// Services routed to the emulator when targeting a local backend.
const EMULATED_SERVICES: &[&str] = &[
    "apigateway",
    "appautoscaling",
    "autoscaling",
    "cloudwatch",
    "ec2",
    "ecr",
    "ecs",
    "elbv2",
    "iam",
    "kms",
    "lambda",
    "logs",
    "rds",
    "s3",
    "sts",
];

/// Quote and escape a string literal, including template sequences.
pub fn string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${")
        .replace("%{", "%%{");
    format!("\"{}\"", escaped)
}

/// Escape text placed inside a heredoc.
pub fn heredoc(value: &str) -> String {
    value
        .trim_end_matches('\n')
        .replace("${", "$${")
        .replace("%{", "%%{")
}

pub fn list<S: AsRef<str>>(values: &[S]) -> String {
    let items: Vec<String> = values.iter().map(|v| string(v.as_ref())).collect();
    format!("[{}]", items.join(", "))
}

pub fn boolean(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// `count` value for an optional resource.
pub fn count(enabled: bool) -> &'static str {
    if enabled {
        "1"
    } else {
        "0"
    }
}

/// Map body entries, one `key = "value"` per line.
pub fn map_entries<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a String)>,
    indent: usize,
) -> String {
    let pad = " ".repeat(indent);
    entries
        .into_iter()
        .map(|(k, v)| format!("{}{} = {}", pad, k, string(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Provider arguments redirecting API calls to a local emulator.
pub fn provider_settings(backend: &Backend) -> String {
    match backend {
        Backend::Aws => String::new(),
        Backend::LocalEmulation { .. } => {
            let endpoints: Vec<String> = EMULATED_SERVICES
                .iter()
                .map(|service| format!("    {:<11} = var.aws_endpoint_url", service))
                .collect();
            format!(
                "  skip_credentials_validation = true\n  skip_metadata_api_check     = true\n  skip_requesting_account_id  = true\n  s3_use_path_style           = true\n\n  endpoints {{\n{}\n  }}\n",
                endpoints.join("\n")
            )
        }
    }
}

fn rule_block(kind: &str, rule: &FirewallRule) -> String {
    format!(
        "  {kind} {{\n    description = {}\n    from_port   = {}\n    to_port     = {}\n    protocol    = {}\n    cidr_blocks = [{}]\n  }}",
        string(&rule.description),
        rule.from_port,
        rule.to_port,
        string(&rule.protocol),
        string(&rule.cidr),
    )
}

/// Inline `ingress`/`egress` blocks for an `aws_security_group`.
pub fn security_group_rules(ingress: &[FirewallRule], egress: &[FirewallRule]) -> String {
    ingress
        .iter()
        .map(|rule| rule_block("ingress", rule))
        .chain(egress.iter().map(|rule| rule_block("egress", rule)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Body of the `local.alarms` map.
pub fn alarms(alarms: &[AlarmPlan]) -> String {
    alarms
        .iter()
        .map(|alarm| {
            format!(
                "    {} = {{\n      metric     = {}\n      namespace  = {}\n      threshold  = {}\n      comparison = {}\n    }}",
                string(&alarm.name),
                string(&alarm.metric),
                string(&alarm.namespace),
                alarm.threshold,
                string(&alarm.comparison),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A declared input variable with its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfVariable {
    pub name: String,
    pub kind: &'static str,
    pub description: String,
    /// HCL expression used as the default.
    pub default: String,
    pub sensitive: bool,
}

impl TfVariable {
    pub fn string(name: &str, description: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "string",
            description: description.to_string(),
            default: string(default),
            sensitive: false,
        }
    }

    pub fn number(name: &str, description: &str, default: impl std::fmt::Display) -> Self {
        Self {
            name: name.to_string(),
            kind: "number",
            description: description.to_string(),
            default: default.to_string(),
            sensitive: false,
        }
    }

    pub fn to_hcl(&self) -> String {
        let mut block = format!(
            "variable {} {{\n  description = {}\n  type        = {}\n  default     = {}\n",
            string(&self.name),
            string(&self.description),
            self.kind,
            self.default
        );
        if self.sensitive {
            block.push_str("  sensitive   = true\n");
        }
        block.push('}');
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_escaping() {
        assert_eq!(string("a\"b"), "\"a\\\"b\"");
        assert_eq!(string("${x}"), "\"$${x}\"");
    }

    #[test]
    fn test_local_provider_settings() {
        assert!(provider_settings(&Backend::Aws).is_empty());

        let settings = provider_settings(&Backend::local("http://localhost:4566"));
        assert!(settings.contains("s3_use_path_style           = true"));
        assert!(settings.contains("lambda      = var.aws_endpoint_url"));
    }

    #[test]
    fn test_variable_block() {
        let var = TfVariable::number("min_capacity", "Minimum instances", 2);
        assert_eq!(
            var.to_hcl(),
            "variable \"min_capacity\" {\n  description = \"Minimum instances\"\n  type        = number\n  default     = 2\n}"
        );
    }
}
