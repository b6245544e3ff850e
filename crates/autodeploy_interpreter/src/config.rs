//! Oracle configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::interpreter::RetryPolicy;

/// Oracle API provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl OracleProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleProvider::OpenAI => "openai",
            OracleProvider::Anthropic => "anthropic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(OracleProvider::OpenAI),
            "anthropic" => Some(OracleProvider::Anthropic),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            OracleProvider::OpenAI => "gpt-4o-mini",
            OracleProvider::Anthropic => "claude-sonnet-4-5",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            OracleProvider::OpenAI => "https://api.openai.com/v1",
            OracleProvider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            OracleProvider::OpenAI => "OPENAI_API_KEY",
            OracleProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Oracle section of the deployment configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: OracleProvider,
    /// Model name; the provider default when unset
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// API base URL; the provider default when unset
    pub base_url: Option<String>,
    pub max_attempts: u32,
    /// Wait before the first retry, doubled on each further retry
    pub backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            provider: OracleProvider::default(),
            model: None,
            api_key: None,
            base_url: None,
            max_attempts: retry.max_attempts,
            backoff_ms: retry.initial_backoff.as_millis() as u64,
            request_timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "(redacted)"))
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_ms", &self.backoff_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl OracleConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OracleConfig::default();
        assert_eq!(config.provider, OracleProvider::OpenAI);
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.base_url(), "https://api.openai.com/v1");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = OracleConfig {
            api_key: Some("sk-live-123".into()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-live-123"));
        assert!(debug.contains("(redacted)"));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(OracleProvider::parse(" Anthropic "), Some(OracleProvider::Anthropic));
        assert_eq!(OracleProvider::parse("openai"), Some(OracleProvider::OpenAI));
        assert_eq!(OracleProvider::parse("bedrock"), None);
        assert_eq!(OracleProvider::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
    }
}
