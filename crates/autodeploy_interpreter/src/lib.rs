//! # autodeploy_interpreter
//!
//! Natural language instruction interpreter for AutoDeploy.
//!
//! Sends an instruction to a language oracle with a fixed prompt and turns
//! the JSON it returns into a [`StructuredSpec`](autodeploy_spec::StructuredSpec).
//! Fields the oracle omits or gets wrong fall back to their defaults.
//!
//! ## Features
//!
//! - OpenAI and Anthropic oracles over HTTPS
//! - Bounded retry with exponential backoff for network, rate-limit and
//!   server errors
//! - Markdown code fence stripping
//! - Scripted [`MockOracle`] for tests
//!
//! ## Example
//!
//! ```rust,no_run
//! use autodeploy_interpreter::{InstructionInterpreter, LlmOracle, OracleProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = LlmOracle::new(OracleProvider::OpenAI, "sk-...", None);
//! let interpreter = InstructionInterpreter::new(Arc::new(oracle));
//!
//! let validated = interpreter
//!     .interpret("Deploy a Node.js website on AWS using EC2 for production")
//!     .await?;
//! println!("{:?}", validated.spec);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod interpreter;
pub mod llm;
pub mod mock;
pub mod oracle;

pub use config::{OracleConfig, OracleProvider};
pub use error::{OracleError, OracleResult, ParseError, ParseResult};
pub use interpreter::{strip_code_fences, InstructionInterpreter, RetryPolicy};
pub use llm::LlmOracle;
pub use mock::MockOracle;
pub use oracle::{Oracle, OracleRequest, DEFAULT_MAX_TOKENS, SYSTEM_PROMPT};
