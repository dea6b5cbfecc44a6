//! Error types for backup and restore.

use pocketwall_crypto::CryptoError;
use pocketwall_types::StoreError;
use thiserror::Error;

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors raised while creating or restoring a backup.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Encryption was requested, or the backup is encrypted, but no password was given.
    #[error("a password is required for encrypted backups")]
    PasswordRequired,

    /// Neither the current nor the legacy decoder could open the backup.
    #[error("invalid password or corrupted backup file")]
    InvalidPasswordOrCorrupt,

    /// The backup belongs to a different account.
    #[error("backup belongs to account {backup_owner}, but {current_user} is signed in")]
    OwnershipMismatch {
        backup_owner: String,
        current_user: String,
    },

    /// The backup could not be parsed or the import was rejected.
    #[error("restore failed: {0}")]
    RestoreFailed(String),

    /// The crypto provider failed (not a password problem).
    #[error("encryption error: {0}")]
    Encryption(#[from] CryptoError),

    /// A collaborator failed while exporting.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackupError {
    /// Returns true for errors the user can fix by retrying with other input
    /// (a password, or an explicit ownership override).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PasswordRequired | Self::InvalidPasswordOrCorrupt | Self::OwnershipMismatch { .. }
        )
    }
}
