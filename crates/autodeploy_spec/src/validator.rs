//! Schema validation for oracle responses.
//!
//! The oracle returns untyped JSON. [`SpecValidator::from_oracle_json`] turns
//! it into a fully typed [`StructuredSpec`], replacing every missing or
//! invalid field with its documented default and recording the substitution.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{SpecError, SpecResult};
use crate::models::{
    CloudProvider, DeploymentType, Environment, Framework, ScalingRequirement, SecurityLevel,
    StructuredSpec,
};

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Why a field fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    Missing,
    Invalid(String),
}

/// A field that was filled with its default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDefault {
    pub field: &'static str,
    pub default: String,
    pub reason: DefaultReason,
}

impl std::fmt::Display for AppliedDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            DefaultReason::Missing => {
                write!(f, "{} missing, defaulted to '{}'", self.field, self.default)
            }
            DefaultReason::Invalid(value) => write!(
                f,
                "{} had invalid value {}, defaulted to '{}'",
                self.field, value, self.default
            ),
        }
    }
}

/// Spec built from an oracle response.
#[derive(Debug, Clone)]
pub struct ValidatedSpec {
    pub spec: StructuredSpec,
    pub defaults: Vec<AppliedDefault>,
    pub warnings: Vec<String>,
}

impl ValidatedSpec {
    pub fn was_defaulted(&self, field: &str) -> bool {
        self.defaults.iter().any(|d| d.field == field)
    }
}

fn region_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-[0-9]$").expect("region pattern is valid")
    })
}

/// Whether `region` looks like an AWS region name, e.g. `eu-west-1`.
pub fn is_valid_region(region: &str) -> bool {
    region_pattern().is_match(region)
}

/// Validator for structured specs.
pub struct SpecValidator;

impl SpecValidator {
    /// Parse oracle response text (already stripped of code fences).
    pub fn from_oracle_text(raw_instruction: &str, text: &str) -> SpecResult<ValidatedSpec> {
        let value: Value = serde_json::from_str(text.trim())
            .map_err(|e| SpecError::MalformedJson(e.to_string()))?;
        Self::from_oracle_json(raw_instruction, &value)
    }

    /// Build a spec from an oracle JSON value, defaulting field by field.
    pub fn from_oracle_json(raw_instruction: &str, value: &Value) -> SpecResult<ValidatedSpec> {
        let object = value
            .as_object()
            .ok_or_else(|| SpecError::NotAnObject(describe(value)))?;

        let mut builder = FieldReader {
            object,
            defaults: Vec::new(),
            warnings: Vec::new(),
        };

        let defaults = StructuredSpec::default();

        let deployment_type = builder.string_field(
            "deployment_type",
            defaults.deployment_type.as_str(),
            DeploymentType::parse,
        );
        let framework = builder.framework(&defaults.framework);
        let cloud_provider = builder.string_field(
            "cloud_provider",
            defaults.cloud_provider.as_str(),
            CloudProvider::parse,
        );
        let database_required = builder.bool_field("database_required", defaults.database_required);
        let scaling_requirements = builder.string_field(
            "scaling_requirements",
            defaults.scaling_requirements.as_str(),
            ScalingRequirement::parse,
        );
        let environment = builder.string_field(
            "environment",
            defaults.environment.as_str(),
            Environment::parse,
        );
        let security_level = builder.string_field(
            "security_level",
            defaults.security_level.as_str(),
            SecurityLevel::parse,
        );
        let region = builder.string_field("region", &defaults.region, |s| {
            let s = s.trim().to_lowercase();
            region_pattern().is_match(&s).then_some(s)
        });

        let spec = StructuredSpec {
            deployment_type: deployment_type.unwrap_or(defaults.deployment_type),
            framework,
            cloud_provider: cloud_provider.unwrap_or(defaults.cloud_provider),
            database_required,
            scaling_requirements: scaling_requirements.unwrap_or(defaults.scaling_requirements),
            environment: environment.unwrap_or(defaults.environment),
            security_level: security_level.unwrap_or(defaults.security_level),
            region: region.unwrap_or(defaults.region),
            raw_instruction: raw_instruction.to_string(),
        };

        for applied in &builder.defaults {
            warn!("Oracle response: {}", applied);
        }

        Ok(ValidatedSpec {
            spec,
            defaults: builder.defaults,
            warnings: builder.warnings,
        })
    }

    /// Check a spec that was built outside the interpreter.
    pub fn validate_spec(spec: &StructuredSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let DeploymentType::Unsupported(name) = &spec.deployment_type {
            result.add_error(format!("Unsupported deployment_type '{}'", name));
        }

        if !spec.framework.is_known() {
            result.add_warning(format!(
                "Framework '{}' has no built-in policy entry",
                spec.framework
            ));
        }

        if !region_pattern().is_match(&spec.region) {
            result.add_error(format!("Region '{}' is not a valid region name", spec.region));
        }

        if spec.raw_instruction.trim().is_empty() {
            result.add_warning("Spec carries no raw instruction for audit");
        }

        result
    }
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    defaults: Vec<AppliedDefault>,
    warnings: Vec<String>,
}

impl FieldReader<'_> {
    fn record(&mut self, field: &'static str, default: &str, reason: DefaultReason) {
        self.defaults.push(AppliedDefault {
            field,
            default: default.to_string(),
            reason,
        });
    }

    /// Read a string field and parse it; `None` means the default applies.
    fn string_field<T>(
        &mut self,
        field: &'static str,
        default: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        match self.object.get(field) {
            None | Some(Value::Null) => {
                self.record(field, default, DefaultReason::Missing);
                None
            }
            Some(Value::String(s)) => {
                let parsed = parse(s);
                if parsed.is_none() {
                    self.record(field, default, DefaultReason::Invalid(format!("'{}'", s)));
                }
                parsed
            }
            Some(other) => {
                self.record(field, default, DefaultReason::Invalid(describe(other)));
                None
            }
        }
    }

    fn bool_field(&mut self, field: &'static str, default: bool) -> bool {
        match self.object.get(field) {
            None | Some(Value::Null) => {
                self.record(field, &default.to_string(), DefaultReason::Missing);
                default
            }
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
            Some(other) => {
                self.record(
                    field,
                    &default.to_string(),
                    DefaultReason::Invalid(describe(other)),
                );
                default
            }
        }
    }

    fn framework(&mut self, default: &Framework) -> Framework {
        let framework = self
            .string_field("framework", default.as_str(), |s| {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| Framework::new(trimmed))
            })
            .unwrap_or_else(|| default.clone());

        if !framework.is_known() {
            self.warnings.push(format!(
                "framework '{}' is not one of {}",
                framework,
                Framework::KNOWN.join(", ")
            ));
        }
        framework
    }
}

fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.len() > 80 {
        let cut = text
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= 77)
            .last()
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_response() {
        let value = json!({
            "deployment_type": "web_application",
            "framework": "Node.js",
            "cloud_provider": "aws",
            "database_required": true,
            "scaling_requirements": "auto",
            "environment": "production",
            "security_level": "high",
            "region": "eu-west-1"
        });

        let validated = SpecValidator::from_oracle_json("deploy", &value).unwrap();
        assert!(validated.defaults.is_empty());
        assert_eq!(validated.spec.framework.as_str(), "nodejs");
        assert_eq!(validated.spec.environment, Environment::Production);
        assert_eq!(validated.spec.region, "eu-west-1");
        assert!(validated.spec.database_required);
    }

    #[test]
    fn test_missing_scaling_defaults_to_manual() {
        let value = json!({
            "deployment_type": "web_application",
            "framework": "nodejs",
            "cloud_provider": "aws",
            "database_required": false,
            "environment": "production",
            "security_level": "standard",
            "region": "us-east-1"
        });

        let validated = SpecValidator::from_oracle_json("deploy", &value).unwrap();
        assert_eq!(validated.spec.scaling_requirements, ScalingRequirement::Manual);
        assert!(validated.was_defaulted("scaling_requirements"));
        assert_eq!(validated.defaults.len(), 1);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let value = json!({
            "deployment_type": "mainframe",
            "database_required": "sometimes",
            "environment": 7,
            "region": "Mars"
        });

        let validated = SpecValidator::from_oracle_json("deploy", &value).unwrap();
        assert_eq!(validated.spec.deployment_type, DeploymentType::WebApplication);
        assert!(!validated.spec.database_required);
        assert_eq!(validated.spec.environment, Environment::Development);
        assert_eq!(validated.spec.region, "us-east-1");
        assert!(!is_valid_region("Mars"));
        assert!(is_valid_region("us-gov-west-1"));
        assert!(matches!(
            validated
                .defaults
                .iter()
                .find(|d| d.field == "deployment_type")
                .map(|d| &d.reason),
            Some(DefaultReason::Invalid(v)) if v == "'mainframe'"
        ));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let result = SpecValidator::from_oracle_json("deploy", &json!(["web_application"]));
        assert!(matches!(result, Err(SpecError::NotAnObject(_))));

        let result = SpecValidator::from_oracle_text("deploy", "not json at all");
        assert!(matches!(result, Err(SpecError::MalformedJson(_))));
    }

    #[test]
    fn test_unknown_framework_is_kept_with_warning() {
        let validated =
            SpecValidator::from_oracle_json("deploy", &json!({"framework": "Elixir"})).unwrap();
        assert_eq!(validated.spec.framework.as_str(), "elixir");
        assert!(!validated.warnings.is_empty());
    }

    #[test]
    fn test_validate_spec_flags_unsupported_type() {
        let spec = StructuredSpec::new("x")
            .with_deployment_type(DeploymentType::Unsupported("mainframe".to_string()));
        let result = SpecValidator::validate_spec(&spec);
        assert!(!result.valid);
    }
}
