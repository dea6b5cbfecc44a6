//! Configuration for the protection layer.

use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest trial window a configuration may ask for (one year).
pub const MAX_TRIAL_HOURS: i64 = 24 * 366;

/// Highest accepted PBKDF2 iteration count.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Tunables shared by the crypto, backup, and trial components.
///
/// Fixed secrets (the trial system key, the license checksum salt) are
/// compiled in and deliberately absent here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// PBKDF2 iteration count for password-derived keys.
    pub kdf_iterations: u32,
    /// Length of the evaluation window in hours.
    pub trial_hours: i64,
    /// Key-value store key holding the encrypted trial state.
    pub trial_storage_key: String,
    /// Key-value store key holding the user settings object.
    pub settings_key: String,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: 100_000,
            trial_hours: 72,
            trial_storage_key: "pocketwall_trial_state".to_string(),
            settings_key: "pocketwall_user_settings".to_string(),
        }
    }
}

impl ProtectionConfig {
    /// Loads configuration from a JSON file. A missing file yields defaults;
    /// missing fields fall back to their defaults individually. Out-of-range
    /// values are rejected.
    pub async fn load(path: &Path) -> StoreResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let config: Self = serde_json::from_str(&contents)?;
                config.validate()?;
                tracing::debug!("Loaded protection config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Checks every value is usable.
    pub fn validate(&self) -> StoreResult<()> {
        if !(1..=MAX_KDF_ITERATIONS).contains(&self.kdf_iterations) {
            return Err(StoreError::InvalidConfig(format!(
                "kdf_iterations must be between 1 and {MAX_KDF_ITERATIONS}, got {}",
                self.kdf_iterations
            )));
        }
        if !(1..=MAX_TRIAL_HOURS).contains(&self.trial_hours) {
            return Err(StoreError::InvalidConfig(format!(
                "trial_hours must be between 1 and {MAX_TRIAL_HOURS}, got {}",
                self.trial_hours
            )));
        }
        if self.trial_storage_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "trial_storage_key must not be empty".to_string(),
            ));
        }
        if self.settings_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "settings_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
