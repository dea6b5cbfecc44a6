//! Raw AEAD encryption using AES-256-GCM.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, KEY_SIZE};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use std::sync::OnceLock;

/// Size of nonce in bytes (96 bits for AES-GCM).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const PROBE_PLAINTEXT: &[u8] = b"pocketwall capability probe";

static PROBE: OnceLock<Result<(), String>> = OnceLock::new();

/// Encrypted bytes plus the nonce they were sealed with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Returns the total size of the encrypted data.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

/// Checks that the AEAD provider and the OS random source work.
///
/// The self test runs once per process; later calls return the cached
/// outcome. A failure here is an environment problem, reported as
/// [`CryptoError::Unavailable`], never as a decryption failure.
pub fn ensure_available() -> CryptoResult<()> {
    PROBE
        .get_or_init(run_self_test)
        .clone()
        .map_err(CryptoError::Unavailable)
}

fn run_self_test() -> Result<(), String> {
    let mut entropy = [0u8; 16];
    rand::rngs::OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| format!("random source: {e}"))?;

    let key = [0x5a_u8; KEY_SIZE];
    let nonce = [0xa5_u8; NONCE_SIZE];
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| format!("cipher init: {e}"))?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), PROBE_PLAINTEXT)
        .map_err(|e| format!("seal: {e}"))?;
    if sealed.len() != PROBE_PLAINTEXT.len() + TAG_SIZE {
        return Err("unexpected tag length".to_string());
    }
    let opened = cipher
        .decrypt(Nonce::from_slice(&nonce), sealed.as_ref())
        .map_err(|e| format!("open: {e}"))?;
    if opened != PROBE_PLAINTEXT {
        return Err("round trip mismatch".to_string());
    }
    Ok(())
}

/// Encrypts plaintext using AES-256-GCM with a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts ciphertext using AES-256-GCM.
///
/// Returns [`CryptoError::DecryptionFailed`] if the tag does not verify.
pub fn decrypt(key: &DerivedKey, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    if encrypted.ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::MalformedPackage(
            "ciphertext shorter than authentication tag".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&encrypted.nonce);

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed)
}
