//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The controller is offline and the operation cannot be queued.
    #[error("sync is offline")]
    Offline,

    /// The remote rejected the request.
    #[error("remote error: {0}")]
    Remote(String),
}

impl SyncError {
    /// Returns true if retrying later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Offline)
    }
}
