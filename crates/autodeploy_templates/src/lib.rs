//! # autodeploy_templates
//!
//! Terraform artifact rendering for AutoDeploy.
//!
//! A [`ResourcePlan`](autodeploy_spec::ResourcePlan) is rendered through the
//! template family of its deployment type into the fixed artifact set:
//!
//! - `provider.tf`
//! - `compute.tf`
//! - `network.tf`
//! - `security.tf`
//! - `variables.tf`
//! - `outputs.tf`
//!
//! Rendering is pure. The same plan always yields byte-identical artifacts,
//! and a placeholder without a value is an error rather than an empty string.
//!
//! ## Example
//!
//! ```rust,no_run
//! use autodeploy_policy::Analyzer;
//! use autodeploy_spec::StructuredSpec;
//! use autodeploy_templates::ArtifactRenderer;
//!
//! let plan = Analyzer::standard().analyze(&StructuredSpec::new("node api")).unwrap();
//! let artifacts = ArtifactRenderer::new().render(&plan).unwrap();
//!
//! for (name, content) in artifacts.iter() {
//!     println!("{name}: {} bytes", content.len());
//! }
//! ```

pub mod artifacts;
pub mod error;
pub mod family;
pub mod hcl;
pub mod renderer;
pub mod store;

pub use artifacts::ArtifactRenderer;
pub use error::{TemplateError, TemplateResult};
pub use family::{family_for, ProviderRequirement, TemplateFamily};
pub use renderer::{TemplateRenderer, Variables};
pub use store::TemplateStore;
