//! # autodeploy_spec
//!
//! Data model shared by every AutoDeploy stage.
//!
//! - **StructuredSpec**: typed form of a deployment instruction, with a
//!   documented default for every field
//! - **ResourcePlan**: concrete, ordered infrastructure plan produced by the
//!   analyzer
//! - **ArtifactSet**: fixed set of rendered Terraform files
//! - **Validation**: the single boundary where untyped oracle JSON becomes a
//!   typed spec
//!
//! ## Example
//!
//! ```rust
//! use autodeploy_spec::{Environment, SpecValidator};
//! use serde_json::json;
//!
//! let response = json!({"deployment_type": "web_application", "environment": "prod"});
//! let validated = SpecValidator::from_oracle_json("Deploy my site", &response).unwrap();
//!
//! assert_eq!(validated.spec.environment, Environment::Production);
//! assert!(validated.was_defaulted("scaling_requirements"));
//! ```

pub mod artifact;
pub mod error;
pub mod models;
pub mod plan;
pub mod validator;

pub use artifact::{ArtifactKind, ArtifactSet};
pub use error::{SpecError, SpecResult};
pub use models::*;
pub use plan::*;
pub use validator::{
    is_valid_region, AppliedDefault, DefaultReason, SpecValidator, ValidatedSpec,
    ValidationResult,
};
