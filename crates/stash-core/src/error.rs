//! Error taxonomy for the sharing protocol.

use thiserror::Error;

/// Sharing protocol error types
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Only the owner may perform this action")]
    NotOwner,

    #[error("Requester is not a collaborator on this resource")]
    NotCollaborator,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid share request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ShareError {
    /// Permission failures are permanent: they must never be retried
    /// automatically and never roll back unrelated optimistic state.
    pub fn is_permission(&self) -> bool {
        matches!(
            self,
            ShareError::NotOwner | ShareError::NotCollaborator | ShareError::Forbidden
        )
    }
}

/// Result type alias for sharing operations
pub type Result<T> = std::result::Result<T, ShareError>;
