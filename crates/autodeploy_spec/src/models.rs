//! Structured deployment specification.
//!
//! A [`StructuredSpec`] is the typed form of a free-text deployment
//! instruction. Every field has a documented default so a spec is never
//! partially populated.

use serde::{Deserialize, Serialize};

/// Kind of workload being deployed.
///
/// Values outside the known set are kept as [`DeploymentType::Unsupported`]
/// so that downstream stages can reject them with the offending name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum DeploymentType {
    #[default]
    WebApplication,
    Serverless,
    Container,
    StaticSite,
    Unsupported(String),
}

impl DeploymentType {
    /// The four supported deployment types.
    pub const SUPPORTED: [DeploymentType; 4] = [
        DeploymentType::WebApplication,
        DeploymentType::Serverless,
        DeploymentType::Container,
        DeploymentType::StaticSite,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DeploymentType::WebApplication => "web_application",
            DeploymentType::Serverless => "serverless",
            DeploymentType::Container => "container",
            DeploymentType::StaticSite => "static_site",
            DeploymentType::Unsupported(name) => name.as_str(),
        }
    }

    /// Parse a known deployment type, folding common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "web_application" | "web_app" | "webapp" | "web" | "website" | "vm" | "ec2" => {
                Some(DeploymentType::WebApplication)
            }
            "serverless" | "lambda" | "function" => Some(DeploymentType::Serverless),
            "container" | "containers" | "docker" | "ecs" | "fargate" => {
                Some(DeploymentType::Container)
            }
            "static_site" | "static" | "static_website" | "s3" => Some(DeploymentType::StaticSite),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DeploymentType::Unsupported(_))
    }
}

impl From<String> for DeploymentType {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(DeploymentType::Unsupported(value))
    }
}

impl From<DeploymentType> for String {
    fn from(value: DeploymentType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application framework, normalised to a lowercase canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Framework(String);

impl Framework {
    pub const NODEJS: &'static str = "nodejs";
    pub const PYTHON: &'static str = "python";
    pub const JAVA: &'static str = "java";
    pub const GO: &'static str = "go";
    pub const DOCKER: &'static str = "docker";
    pub const STATIC: &'static str = "static";

    /// Frameworks with built-in policy entries.
    pub const KNOWN: [&'static str; 6] = [
        Self::NODEJS,
        Self::PYTHON,
        Self::JAVA,
        Self::GO,
        Self::DOCKER,
        Self::STATIC,
    ];

    pub fn new(name: &str) -> Self {
        Self(Self::normalize(name))
    }

    /// Lowercase and fold aliases onto their canonical name.
    pub fn normalize(name: &str) -> String {
        let key = name.trim().to_lowercase();
        let canonical = match key.as_str() {
            "node" | "node.js" | "nodejs" | "node_js" | "express" | "nextjs" | "next.js"
            | "javascript" | "typescript" => Self::NODEJS,
            "python" | "python3" | "flask" | "django" | "fastapi" => Self::PYTHON,
            "java" | "spring" | "spring-boot" | "springboot" => Self::JAVA,
            "go" | "golang" => Self::GO,
            "docker" | "container" => Self::DOCKER,
            "static" | "html" | "static_html" | "react" | "vue" | "angular" => Self::STATIC,
            _ => return key,
        };
        canonical.to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(&self.0.as_str())
    }
}

impl Default for Framework {
    fn default() -> Self {
        Self(Self::NODEJS.to_string())
    }
}

impl From<String> for Framework {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<Framework> for String {
    fn from(value: Framework) -> Self {
        value.0
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    #[default]
    Aws,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "aws" | "amazon" | "amazon web services" => Some(CloudProvider::Aws),
            _ => None,
        }
    }

    /// Get the Terraform provider name.
    pub fn provider_name(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
        }
    }

    /// Provider source address for the required_providers block.
    pub fn provider_source(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "hashicorp/aws",
        }
    }

    /// Get default region for the provider.
    pub fn default_region(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "us-east-1",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scaling requirement stated by the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalingRequirement {
    #[default]
    Manual,
    Auto,
    HighAvailability,
}

impl ScalingRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingRequirement::Manual => "manual",
            ScalingRequirement::Auto => "auto",
            ScalingRequirement::HighAvailability => "high_availability",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "manual" | "fixed" | "none" => Some(ScalingRequirement::Manual),
            "auto" | "autoscaling" | "auto_scaling" | "automatic" => Some(ScalingRequirement::Auto),
            "high_availability" | "ha" | "highly_available" => {
                Some(ScalingRequirement::HighAvailability)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalingRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target environment tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Short name used in resource names and tags.
    pub fn short_name(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Staging => "staging",
            Environment::Production => "prod",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "develop" | "test" | "testing" => Some(Environment::Development),
            "staging" | "stage" | "qa" | "preprod" => Some(Environment::Staging),
            "production" | "prod" | "live" => Some(Environment::Production),
            _ => None,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requested security posture. Ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Basic,
    #[default]
    Standard,
    High,
    Enterprise,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 4] = [
        SecurityLevel::Basic,
        SecurityLevel::Standard,
        SecurityLevel::High,
        SecurityLevel::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Basic => "basic",
            SecurityLevel::Standard => "standard",
            SecurityLevel::High => "high",
            SecurityLevel::Enterprise => "enterprise",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "low" | "minimal" => Some(SecurityLevel::Basic),
            "standard" | "medium" | "default" => Some(SecurityLevel::Standard),
            "high" | "strict" => Some(SecurityLevel::High),
            "enterprise" | "maximum" | "compliance" => Some(SecurityLevel::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed deployment specification produced by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSpec {
    #[serde(default)]
    pub deployment_type: DeploymentType,
    #[serde(default)]
    pub framework: Framework,
    #[serde(default)]
    pub cloud_provider: CloudProvider,
    #[serde(default)]
    pub database_required: bool,
    #[serde(default)]
    pub scaling_requirements: ScalingRequirement,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub security_level: SecurityLevel,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub raw_instruction: String,
}

fn default_region() -> String {
    CloudProvider::default().default_region().to_string()
}

impl Default for StructuredSpec {
    fn default() -> Self {
        Self {
            deployment_type: DeploymentType::default(),
            framework: Framework::default(),
            cloud_provider: CloudProvider::default(),
            database_required: false,
            scaling_requirements: ScalingRequirement::default(),
            environment: Environment::default(),
            security_level: SecurityLevel::default(),
            region: default_region(),
            raw_instruction: String::new(),
        }
    }
}

impl StructuredSpec {
    /// Create a spec with every field at its default.
    pub fn new(raw_instruction: impl Into<String>) -> Self {
        Self {
            raw_instruction: raw_instruction.into(),
            ..Self::default()
        }
    }

    pub fn with_deployment_type(mut self, deployment_type: DeploymentType) -> Self {
        self.deployment_type = deployment_type;
        self
    }

    pub fn with_framework(mut self, framework: &str) -> Self {
        self.framework = Framework::new(framework);
        self
    }

    pub fn with_database(mut self, required: bool) -> Self {
        self.database_required = required;
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingRequirement) -> Self {
        self.scaling_requirements = scaling;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = level;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = StructuredSpec::new("deploy something");
        assert_eq!(spec.deployment_type, DeploymentType::WebApplication);
        assert_eq!(spec.framework.as_str(), "nodejs");
        assert_eq!(spec.cloud_provider, CloudProvider::Aws);
        assert!(!spec.database_required);
        assert_eq!(spec.scaling_requirements, ScalingRequirement::Manual);
        assert_eq!(spec.environment, Environment::Development);
        assert_eq!(spec.security_level, SecurityLevel::Standard);
        assert_eq!(spec.region, "us-east-1");
        assert_eq!(spec.raw_instruction, "deploy something");
    }

    #[test]
    fn test_framework_aliases() {
        assert_eq!(Framework::new("Node.js").as_str(), "nodejs");
        assert_eq!(Framework::new("express").as_str(), "nodejs");
        assert_eq!(Framework::new("Django").as_str(), "python");
        assert_eq!(Framework::new("golang").as_str(), "go");
        assert_eq!(Framework::new("Elixir").as_str(), "elixir");
        assert!(!Framework::new("elixir").is_known());
    }

    #[test]
    fn test_unknown_deployment_type_is_preserved() {
        let parsed: DeploymentType = serde_json::from_str("\"mainframe\"").unwrap();
        assert_eq!(parsed, DeploymentType::Unsupported("mainframe".to_string()));
        assert!(!parsed.is_supported());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"mainframe\"");
    }

    #[test]
    fn test_environment_aliases() {
        assert_eq!(Environment::parse("prod"), Some(Environment::Production));
        assert_eq!(Environment::parse("Dev"), Some(Environment::Development));
        assert_eq!(Environment::parse("stage"), Some(Environment::Staging));
        assert_eq!(Environment::parse("moon"), None);
    }

    #[test]
    fn test_security_level_ordering() {
        assert!(SecurityLevel::Basic < SecurityLevel::Standard);
        assert!(SecurityLevel::High < SecurityLevel::Enterprise);
    }

    #[test]
    fn test_spec_deserializes_with_missing_fields() {
        let spec: StructuredSpec =
            serde_json::from_str(r#"{"deployment_type": "serverless"}"#).unwrap();
        assert_eq!(spec.deployment_type, DeploymentType::Serverless);
        assert_eq!(spec.region, "us-east-1");
        assert_eq!(spec.scaling_requirements, ScalingRequirement::Manual);
    }
}
