//! Password-sealed packages.
//!
//! An [`EncryptedPackage`] is the textual interchange unit for everything the
//! app encrypts with a password: backups, the trial clock, ad-hoc exports.
//! Each package carries its own random salt and nonce, so the same password
//! never reuses a (key, nonce) pair.
//!
//! ```text
//! { "ciphertext": b64, "iv": b64(12), "salt": b64(16), "version": "1" }
//! ```
//!
//! Packages sealed with a non-default KDF cost also carry `"iterations"`, so
//! they open regardless of the opener's configuration.

use crate::cipher::{self, EncryptedData, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, KdfParams, Salt, DEFAULT_ITERATIONS};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current package format tag.
pub const PACKAGE_VERSION: &str = "1";

/// Highest KDF cost a package may ask for.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Ciphertext plus everything needed to re-derive the key and open it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPackage {
    /// AEAD output including the tag, base64.
    pub ciphertext: String,
    /// AEAD nonce, base64.
    pub iv: String,
    /// KDF salt, base64.
    pub salt: String,
    /// Format tag.
    pub version: String,
    /// KDF cost, present only when it differs from [`DEFAULT_ITERATIONS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

impl EncryptedPackage {
    /// Builds a package from a salt, sealed data, and the KDF parameters
    /// the key was derived with.
    pub fn from_parts(salt: &Salt, sealed: &EncryptedData, params: &KdfParams) -> Self {
        Self {
            ciphertext: STANDARD.encode(&sealed.ciphertext),
            iv: STANDARD.encode(sealed.nonce),
            salt: STANDARD.encode(salt.as_bytes()),
            version: PACKAGE_VERSION.to_string(),
            iterations: (params.iterations != DEFAULT_ITERATIONS).then_some(params.iterations),
        }
    }

    /// KDF parameters needed to open this package.
    pub fn kdf_params(&self) -> CryptoResult<KdfParams> {
        match self.iterations {
            None => Ok(KdfParams::default()),
            Some(n) if (1..=MAX_ITERATIONS).contains(&n) => Ok(KdfParams::new(n)),
            Some(n) => Err(CryptoError::MalformedPackage(format!(
                "iteration count {n} out of range"
            ))),
        }
    }

    /// Decodes the base64 fields, checking version and lengths.
    pub fn decode(&self) -> CryptoResult<(Salt, EncryptedData)> {
        if self.version != PACKAGE_VERSION {
            return Err(CryptoError::UnsupportedVersion(self.version.clone()));
        }

        let salt = Salt::from_slice(&decode_field("salt", &self.salt)?)?;

        let iv = decode_field("iv", &self.iv)?;
        let nonce: [u8; NONCE_SIZE] = iv.as_slice().try_into().map_err(|_| {
            CryptoError::MalformedPackage(format!(
                "iv must be {NONCE_SIZE} bytes, got {}",
                iv.len()
            ))
        })?;

        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::MalformedPackage(
                "ciphertext shorter than authentication tag".to_string(),
            ));
        }

        Ok((salt, EncryptedData { nonce, ciphertext }))
    }

    /// Serializes the package to compact JSON.
    pub fn to_json(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a package from JSON.
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::MalformedPackage(format!("not a package: {e}")))
    }

    /// Size of the sealed payload in bytes (ciphertext plus tag), if decodable.
    pub fn ciphertext_len(&self) -> Option<usize> {
        STANDARD.decode(&self.ciphertext).ok().map(|c| c.len())
    }
}

fn decode_field(name: &str, encoded: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::MalformedPackage(format!("invalid base64 in {name}: {e}")))
}

/// Seals and opens [`EncryptedPackage`]s with a password.
///
/// Holds only KDF parameters, never key material. The parameters set the cost
/// of sealing; opening uses the cost recorded in the package.
#[derive(Clone, Debug, Default)]
pub struct PasswordCipher {
    params: KdfParams,
}

impl PasswordCipher {
    /// Creates a cipher with the given KDF parameters.
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    /// Returns the KDF parameters.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Encrypts raw bytes under a password.
    pub fn seal(&self, plaintext: &[u8], password: &str) -> CryptoResult<EncryptedPackage> {
        self.params.validate()?;
        cipher::ensure_available()?;

        let salt = Salt::random();
        let key = derive_key(password, &salt, &self.params)?;
        let sealed = cipher::encrypt(&key, plaintext)?;

        Ok(EncryptedPackage::from_parts(&salt, &sealed, &self.params))
    }

    /// Encrypts a JSON value as its serialized JSON text.
    pub fn seal_value(&self, value: &Value, password: &str) -> CryptoResult<EncryptedPackage> {
        self.seal(&serde_json::to_vec(value)?, password)
    }

    /// Serializes `value` to JSON and encrypts it.
    pub fn seal_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        password: &str,
    ) -> CryptoResult<EncryptedPackage> {
        self.seal(&serde_json::to_vec(value)?, password)
    }

    /// Decrypts a package to raw bytes.
    pub fn open(&self, package: &EncryptedPackage, password: &str) -> CryptoResult<Vec<u8>> {
        cipher::ensure_available()?;

        let (salt, sealed) = package.decode()?;
        let params = package.kdf_params()?;
        let key = derive_key(password, &salt, &params)?;
        cipher::decrypt(&key, &sealed)
    }

    /// Decrypts a package sealed with [`seal_value`](Self::seal_value).
    /// Plaintext that is not JSON (raw text sealed with [`seal`](Self::seal))
    /// comes back as a string.
    pub fn open_value(&self, package: &EncryptedPackage, password: &str) -> CryptoResult<Value> {
        let plaintext = self.open(package, password)?;
        Ok(match serde_json::from_slice::<Value>(&plaintext) {
            Ok(value) => value,
            Err(_) => Value::String(String::from_utf8_lossy(&plaintext).into_owned()),
        })
    }

    /// Decrypts a package and deserializes the JSON plaintext into `T`.
    pub fn open_json<T: DeserializeOwned>(
        &self,
        package: &EncryptedPackage,
        password: &str,
    ) -> CryptoResult<T> {
        let plaintext = self.open(package, password)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// [`seal`](Self::seal) on a blocking worker thread.
    pub async fn seal_async(
        &self,
        plaintext: Vec<u8>,
        password: String,
    ) -> CryptoResult<EncryptedPackage> {
        let this = self.clone();
        offload(move || this.seal(&plaintext, &password)).await
    }

    /// [`seal_json`](Self::seal_json) on a blocking worker thread.
    pub async fn seal_json_async<T: Serialize + ?Sized>(
        &self,
        value: &T,
        password: String,
    ) -> CryptoResult<EncryptedPackage> {
        let plaintext = serde_json::to_vec(value)?;
        self.seal_async(plaintext, password).await
    }

    /// [`open`](Self::open) on a blocking worker thread.
    pub async fn open_async(
        &self,
        package: EncryptedPackage,
        password: String,
    ) -> CryptoResult<Vec<u8>> {
        let this = self.clone();
        offload(move || this.open(&package, &password)).await
    }

    /// [`open_value`](Self::open_value) on a blocking worker thread.
    pub async fn open_value_async(
        &self,
        package: EncryptedPackage,
        password: String,
    ) -> CryptoResult<Value> {
        let this = self.clone();
        offload(move || this.open_value(&package, &password)).await
    }

    /// [`open_json`](Self::open_json) on a blocking worker thread.
    pub async fn open_json_async<T: DeserializeOwned + Send + 'static>(
        &self,
        package: EncryptedPackage,
        password: String,
    ) -> CryptoResult<T> {
        let this = self.clone();
        offload(move || this.open_json(&package, &password)).await
    }
}

/// Runs CPU-bound key derivation off the async executor.
async fn offload<T, F>(f: F) -> CryptoResult<T>
where
    F: FnOnce() -> CryptoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CryptoError::Worker(e.to_string()))?
}
