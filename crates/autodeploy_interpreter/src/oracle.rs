//! Oracle request contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleResult;

/// Fixed system prompt describing the structured spec schema.
pub const SYSTEM_PROMPT: &str = r#"You are an expert infrastructure engineer. Convert the user's deployment instruction into a JSON object with exactly these fields:

- "deployment_type": one of "web_application", "serverless", "container", "static_site"
- "framework": application framework, lowercase (e.g. "nodejs", "python", "java", "go", "docker", "static")
- "cloud_provider": "aws"
- "database_required": true or false
- "scaling_requirements": one of "manual", "auto", "high_availability"
- "environment": one of "development", "staging", "production"
- "security_level": one of "basic", "standard", "high", "enterprise"
- "region": AWS region code (e.g. "us-east-1")

Omit a field if the instruction does not determine it. Return ONLY the JSON object, with no explanation or formatting."#;

/// Default completion token limit; a spec object is well under this.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// One request to the oracle.
///
/// Built only from the instruction text, so repeating a request is safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OracleRequest {
    pub fn for_instruction(instruction: &str) -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            user: instruction.trim().to_string(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// External language oracle that answers with text.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Provider and model, for diagnostics.
    fn name(&self) -> String;

    /// Make a single completion call. Retrying is the caller's concern.
    async fn complete(&self, request: &OracleRequest) -> OracleResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_deterministic() {
        let a = OracleRequest::for_instruction("  Deploy a Node.js website on AWS\n");
        let b = OracleRequest::for_instruction("Deploy a Node.js website on AWS");

        assert_eq!(a, b);
        assert_eq!(a.temperature, 0.0);
        assert_eq!(a.user, "Deploy a Node.js website on AWS");
    }

    #[test]
    fn test_prompt_lists_every_field() {
        for field in [
            "deployment_type",
            "framework",
            "cloud_provider",
            "database_required",
            "scaling_requirements",
            "environment",
            "security_level",
            "region",
        ] {
            assert!(SYSTEM_PROMPT.contains(field), "prompt is missing {}", field);
        }
    }
}
