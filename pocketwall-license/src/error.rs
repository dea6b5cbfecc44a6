//! Error types for the licensing module.

use pocketwall_crypto::CryptoError;
use pocketwall_types::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only message users see for a rejected key, whatever check failed.
pub const INVALID_KEY_MESSAGE: &str = "invalid license key";

/// Why a license key was rejected. For diagnostics; not shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum KeyRejection {
    /// Not five `-`-separated segments.
    #[error("key must have five segments")]
    InvalidFormat,

    /// First segment is not `PW`.
    #[error("unrecognized key prefix")]
    InvalidPrefix,

    /// Second segment is not a known tier code.
    #[error("unknown tier code")]
    UnknownTier,

    /// Third segment is not a known duration.
    #[error("unknown duration code")]
    UnknownDuration,

    /// Checksum does not match the other fields.
    #[error("checksum mismatch")]
    InvalidChecksum,
}

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// License key failed validation.
    #[error("invalid license key")]
    InvalidKey(KeyRejection),

    /// Tier name given to the generator is not recognized.
    #[error("unknown license tier: {0}")]
    UnknownTierName(String),

    /// Duration given to the generator is not recognized.
    #[error("unknown license duration: {0}")]
    UnknownDurationName(String),

    /// Batch id is not four uppercase alphanumerics.
    #[error("invalid batch id: {0}")]
    InvalidBatch(String),

    /// The stored activation record is incomplete or inconsistent.
    #[error("invalid activation record: {0}")]
    InvalidRecord(String),

    /// Settings or trial storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Trial state could not be sealed.
    #[error("encryption error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns the rejection reason if this is an invalid-key error.
    #[must_use]
    pub fn rejection(&self) -> Option<KeyRejection> {
        match self {
            Self::InvalidKey(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<KeyRejection> for LicenseError {
    fn from(reason: KeyRejection) -> Self {
        Self::InvalidKey(reason)
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
