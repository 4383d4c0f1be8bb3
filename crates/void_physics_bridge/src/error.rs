//! Error types for the physics bridge

use crate::body::BodyHandle;
use crate::collider::ColliderHandle;
use thiserror::Error;

/// Physics bridge errors
///
/// Configuration errors are rejected before anything is applied. Backend
/// errors mean the registry and the dynamics backend disagree about which
/// handles exist; the world cannot be trusted past that point.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Invalid configuration value
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),

    /// Invalid collider shape parameters
    #[error("Invalid collider shape: {0}")]
    InvalidShape(String),

    /// Backend does not hold a rigid body the registry has registered
    #[error("Backend has no rigid body {0:?}")]
    UnknownBody(BodyHandle),

    /// Backend referenced a collider the registry does not know
    #[error("Backend reported unknown collider: {0:?}")]
    UnknownCollider(ColliderHandle),

    /// Backend rejected an operation on a handle it should own
    #[error("Dynamics backend failure: {0}")]
    Backend(String),
}

impl PhysicsError {
    /// Whether the error indicates a broken registry/backend invariant
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownBody(_) | Self::UnknownCollider(_) | Self::Backend(_)
        )
    }
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
