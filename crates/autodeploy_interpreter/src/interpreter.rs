//! Instruction interpretation with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use autodeploy_spec::{SpecValidator, ValidatedSpec};
use tracing::{debug, info, warn};

use crate::error::{OracleError, ParseError, ParseResult};
use crate::oracle::{Oracle, OracleRequest};

/// How often and how patiently to retry the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled for each later one
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    /// Same attempt count, no waiting.
    pub fn immediate() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Wait before `attempt` (1-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.initial_backoff
            .saturating_mul(1u32 << (attempt - 2).min(16))
    }
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Turns free-text instructions into structured specs.
#[derive(Clone)]
pub struct InstructionInterpreter {
    oracle: Arc<dyn Oracle>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for InstructionInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionInterpreter")
            .field("oracle", &self.oracle.name())
            .field("retry", &self.retry)
            .finish()
    }
}

impl InstructionInterpreter {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Interpret `instruction`, filling any field the oracle leaves out.
    pub async fn interpret(&self, instruction: &str) -> ParseResult<ValidatedSpec> {
        if instruction.trim().is_empty() {
            return Err(ParseError::EmptyInstruction);
        }
        info!("Interpreting instruction with {}", self.oracle.name());

        let request = OracleRequest::for_instruction(instruction);
        let text = self.call_with_retry(&request).await?;
        debug!("Oracle response: {}", text);

        let validated = SpecValidator::from_oracle_text(instruction, strip_code_fences(&text))?;
        info!(
            "Interpreted as {} ({}, {}), {} field(s) defaulted",
            validated.spec.deployment_type,
            validated.spec.framework,
            validated.spec.environment.as_str(),
            validated.defaults.len()
        );
        Ok(validated)
    }

    async fn call_with_retry(&self, request: &OracleRequest) -> ParseResult<String> {
        let mut last_error: Option<OracleError> = None;

        for attempt in 1..=self.retry.max_attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.oracle.complete(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    warn!(
                        "Oracle attempt {}/{} failed: {}",
                        attempt, self.retry.max_attempts, e
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    return Err(ParseError::OracleRejected {
                        attempts: attempt,
                        source: e,
                    })
                }
            }
        }

        Err(ParseError::OracleUnavailable {
            attempts: self.retry.max_attempts,
            source: last_error
                .unwrap_or_else(|| OracleError::Network("no attempt was made".to_string())),
        })
    }
}
