//! Password-based encryption for PocketWall.
//!
//! - Key derivation: PBKDF2-HMAC-SHA256, 100k iterations by default
//! - AEAD: AES-256-GCM with a random 96-bit nonce per message
//! - Interchange: [`EncryptedPackage`], base64 fields in a JSON object
//!
//! Wrong passwords and tampered packages fail the same way
//! ([`CryptoError::DecryptionFailed`]); unauthenticated plaintext is never
//! returned.

mod cipher;
mod error;
mod key;
mod package;

pub use cipher::{decrypt, encrypt, ensure_available, EncryptedData, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, generate_random_key, DerivedKey, KdfParams, Salt, DEFAULT_ITERATIONS, KEY_SIZE,
    SALT_SIZE,
};
pub use package::{EncryptedPackage, PasswordCipher, MAX_ITERATIONS, PACKAGE_VERSION};
