//! # autodeploy_policy
//!
//! Requirement analysis for AutoDeploy.
//!
//! The [`Analyzer`] maps a [`StructuredSpec`](autodeploy_spec::StructuredSpec)
//! onto a [`ResourcePlan`](autodeploy_spec::ResourcePlan) by looking values up
//! in [`PolicyTables`]:
//!
//! - **Compute**: keyed by (deployment type, framework, environment); `*`
//!   matches any framework
//! - **Security**: keyed by (resource, environment, security level)
//! - **Scaling**: keyed by (scaling requirement, environment)
//! - **Network**: fixed CIDR scheme inside one VPC block
//!
//! A spec value with no table entry yields [`PolicyError::InvalidSpec`].
//!
//! ## Example
//!
//! ```rust
//! use autodeploy_policy::Analyzer;
//! use autodeploy_spec::{Environment, StructuredSpec};
//!
//! let spec = StructuredSpec::new("Deploy a Node.js site")
//!     .with_environment(Environment::Production);
//! let plan = Analyzer::standard().analyze(&spec).unwrap();
//!
//! assert!(!plan.compute.burstable);
//! assert!(plan.redundancy() >= 2);
//! ```

pub mod analyzer;
pub mod bootstrap;
pub mod error;
pub mod network;
pub mod tables;

pub use analyzer::Analyzer;
pub use error::{PolicyError, PolicyResult};
pub use network::Topology;
pub use tables::{
    ComputeEntry, DatabaseEntry, MonitoringEntry, NetworkPolicy, PolicyTables, ScalingEntry,
    SecurityEntry, ANY_FRAMEWORK,
};
