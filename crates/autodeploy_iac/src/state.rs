//! Deployment lifecycle states.

use serde::{Deserialize, Serialize};

/// Status of a deployment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Session opened, nothing run yet
    #[default]
    Init,
    /// Saved plan computed
    Planned,
    /// Plan applied to real infrastructure
    Applied,
    /// Infrastructure destroyed
    Destroyed,
    /// An operation failed; the working directory is left as the tool left it
    Failed,
}

impl DeploymentStatus {
    /// Check if transition to the given status is valid.
    pub fn can_transition_to(&self, next: &DeploymentStatus) -> bool {
        use DeploymentStatus::*;
        matches!(
            (self, next),
            (Init, Planned)
                | (Planned, Planned)
                | (Planned, Applied)
                | (Init | Planned | Applied, Destroyed)
                | (Init | Planned | Applied, Failed)
        )
    }

    /// Whether no further operation may run in this session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Destroyed | DeploymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Init => "init",
            DeploymentStatus::Planned => "planned",
            DeploymentStatus::Applied => "applied",
            DeploymentStatus::Destroyed => "destroyed",
            DeploymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
