use thiserror::Error;

/// Failures surfaced by the sync client and its transport.
///
/// Permission errors are permanent and never retried automatically; the
/// local optimistic edit stays in place either way so the user can decide
/// what to do with it.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("permission denied: {0}")]
    Denied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("encoding failure: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SyncError {
    /// Permanent errors are not worth retrying with the same input.
    pub fn is_permanent(&self) -> bool {
        matches!(self, SyncError::Denied(_) | SyncError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
