//! Error types for instruction interpretation.

use thiserror::Error;

/// Result type alias for interpretation.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for a single oracle call.
pub type OracleResult<T> = Result<T, OracleError>;

/// Failure of one oracle call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Oracle is not configured (no API key, unknown provider).
    #[error("Oracle not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the oracle API.
    #[error("Oracle API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be read as a completion.
    #[error("Invalid oracle response: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Network, auth, rate-limit and server errors are worth retrying.
    /// Any other 4xx is a rejection of the request itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Network(_) => true,
            OracleError::Status { status, .. } => {
                matches!(*status, 401 | 403 | 429) || *status >= 500
            }
            _ => false,
        }
    }
}

/// Errors that can occur while interpreting an instruction.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Instruction is empty")]
    EmptyInstruction,

    /// Retryable oracle failures persisted through every attempt.
    #[error("Oracle unavailable after {attempts} attempt(s): {source}")]
    OracleUnavailable { attempts: u32, source: OracleError },

    /// The oracle refused the request, possibly after earlier retryable failures.
    #[error("Oracle rejected the request on attempt {attempts}: {source}")]
    OracleRejected { attempts: u32, source: OracleError },

    /// The oracle answered with something other than a JSON object.
    #[error("Unusable oracle response: {0}")]
    InvalidResponse(#[from] autodeploy_spec::SpecError),
}

impl ParseError {
    /// Number of oracle calls made before giving up, if any.
    pub fn attempts(&self) -> u32 {
        match self {
            ParseError::EmptyInstruction => 0,
            ParseError::OracleUnavailable { attempts, .. }
            | ParseError::OracleRejected { attempts, .. } => *attempts,
            ParseError::InvalidResponse(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(OracleError::Network("connection reset".into()).is_retryable());
        assert!(OracleError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(OracleError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(OracleError::Status { status: 401, body: String::new() }.is_retryable());
        assert!(OracleError::Status { status: 403, body: String::new() }.is_retryable());

        assert!(!OracleError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!OracleError::Status { status: 404, body: String::new() }.is_retryable());
        assert!(!OracleError::InvalidResponse("no choices".into()).is_retryable());
        assert!(!OracleError::NotConfigured("OPENAI_API_KEY".into()).is_retryable());
    }
}
