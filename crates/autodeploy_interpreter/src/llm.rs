//! LLM oracle over chat completion APIs.
//!
//! Supports OpenAI chat completions and Anthropic messages.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{OracleConfig, OracleProvider};
use crate::error::{OracleError, OracleResult};
use crate::oracle::{Oracle, OracleRequest};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Oracle backed by a hosted LLM.
pub struct LlmOracle {
    provider: OracleProvider,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for LlmOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmOracle")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"(redacted)")
            .finish()
    }
}

impl LlmOracle {
    /// Create an oracle with explicit settings and provider defaults.
    pub fn new(provider: OracleProvider, api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: provider.default_base_url().to_string(),
            timeout: Duration::from_secs(60),
            client: reqwest::Client::new(),
        }
    }

    /// Create an oracle from configuration. The API key must be present.
    pub fn from_config(config: &OracleConfig) -> OracleResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                OracleError::NotConfigured(format!(
                    "set {} or oracle.api_key",
                    config.provider.api_key_env()
                ))
            })?;

        Ok(Self::new(config.provider, api_key, Some(config.model().to_string()))
            .with_base_url(config.base_url())
            .with_timeout(Duration::from_secs(config.request_timeout_secs)))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> OracleProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_openai(&self, request: &OracleRequest) -> OracleResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let result: OpenAIResponse = read_json(response).await?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::InvalidResponse("no choices in OpenAI response".into()))
    }

    async fn complete_anthropic(&self, request: &OracleRequest) -> OracleResult<String> {
        let url = format!("{}/messages", self.base_url);
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let result: AnthropicResponse = read_json(response).await?;
        let text: String = result
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        if text.is_empty() {
            return Err(OracleError::InvalidResponse(
                "no text in Anthropic response".into(),
            ));
        }
        Ok(text)
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> OracleResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OracleError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

#[async_trait]
impl Oracle for LlmOracle {
    fn name(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }

    async fn complete(&self, request: &OracleRequest) -> OracleResult<String> {
        debug!("Calling {} oracle with model {}", self.provider, self.model);
        match self.provider {
            OracleProvider::OpenAI => self.complete_openai(request).await,
            OracleProvider::Anthropic => self.complete_anthropic(request).await,
        }
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_key() {
        let config = OracleConfig::default();
        let err = LlmOracle::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let config = OracleConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(LlmOracle::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_uses_provider_defaults() {
        let config = OracleConfig {
            provider: OracleProvider::Anthropic,
            api_key: Some("key".into()),
            base_url: Some("http://localhost:8080/v1/".into()),
            ..Default::default()
        };
        let oracle = LlmOracle::from_config(&config).unwrap();

        assert_eq!(oracle.provider(), OracleProvider::Anthropic);
        assert_eq!(oracle.model(), "claude-sonnet-4-5");
        assert_eq!(oracle.name(), "anthropic/claude-sonnet-4-5");
        assert_eq!(oracle.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let oracle = LlmOracle::new(OracleProvider::OpenAI, "sk-secret", None);
        assert!(!format!("{:?}", oracle).contains("sk-secret"));
    }

    #[test]
    fn test_openai_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"environment\":\"production\"}"}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"environment\":\"production\"}")
        );
    }

    #[test]
    fn test_anthropic_response_parsing() {
        let body = r#"{"content":[{"type":"text","text":"{}"}],"usage":{"input_tokens":1,"output_tokens":1}}"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content[0].text.as_deref(), Some("{}"));
    }
}
