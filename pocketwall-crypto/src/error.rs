//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The caller supplied unusable parameters (e.g. zero KDF iterations).
    #[error("invalid crypto parameters: {0}")]
    InvalidParams(String),

    /// The crypto provider failed its capability probe.
    #[error("encryption unavailable: {0}")]
    Unavailable(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authentication failed. Wrong password and tampered data are
    /// deliberately reported the same way.
    #[error("decryption failed (wrong password or tampered data)")]
    DecryptionFailed,

    /// The package could not be decoded (bad base64, wrong field lengths).
    #[error("malformed encrypted package: {0}")]
    MalformedPackage(String),

    /// The package carries a format tag this build does not understand.
    #[error("unsupported package version: {0}")]
    UnsupportedVersion(String),

    /// The blocking worker running key derivation died.
    #[error("crypto worker failed: {0}")]
    Worker(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CryptoError {
    /// Returns true for failures that mean "this password cannot open this data",
    /// as opposed to environment or caller errors.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::DecryptionFailed | Self::MalformedPackage(_) | Self::UnsupportedVersion(_)
        )
    }
}
