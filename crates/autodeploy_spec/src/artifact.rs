//! Rendered infrastructure artifacts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SpecError, SpecResult};
use crate::models::DeploymentType;

/// One of the fixed artifact files. Declaration order is file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Provider,
    Compute,
    Network,
    Security,
    Variables,
    Outputs,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Provider,
        ArtifactKind::Compute,
        ArtifactKind::Network,
        ArtifactKind::Security,
        ArtifactKind::Variables,
        ArtifactKind::Outputs,
    ];

    /// File name written into the working directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Provider => "provider.tf",
            ArtifactKind::Compute => "compute.tf",
            ArtifactKind::Network => "network.tf",
            ArtifactKind::Security => "security.tf",
            ArtifactKind::Variables => "variables.tf",
            ArtifactKind::Outputs => "outputs.tf",
        }
    }

    pub fn from_file_name(name: &str) -> SpecResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_name() == name)
            .ok_or_else(|| SpecError::UnknownArtifact(name.to_string()))
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Ordered set of rendered artifacts for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub deployment_type: DeploymentType,
    files: BTreeMap<ArtifactKind, String>,
}

impl ArtifactSet {
    pub fn new(deployment_type: DeploymentType) -> Self {
        Self {
            deployment_type,
            files: BTreeMap::new(),
        }
    }

    /// Insert rendered content, replacing any previous content for `kind`.
    pub fn insert(&mut self, kind: ArtifactKind, content: impl Into<String>) {
        self.files.insert(kind, content.into());
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&str> {
        self.files.get(&kind).map(String::as_str)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        ArtifactKind::from_file_name(name)
            .ok()
            .and_then(|kind| self.get(kind))
    }

    /// File names in artifact order.
    pub fn names(&self) -> Vec<&'static str> {
        self.files.keys().map(|kind| kind.file_name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.files
            .iter()
            .map(|(kind, content)| (kind.file_name(), content.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True when every fixed artifact is present.
    pub fn is_complete(&self) -> bool {
        ArtifactKind::ALL.iter().all(|kind| self.files.contains_key(kind))
    }
}
