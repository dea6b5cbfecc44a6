//! The evaluation trial.
//!
//! One trial window per installation, tracked by a start time sealed under a
//! compiled-in key and stored in the key-value store. The sealed state stops
//! casual edits from extending the trial; the key itself is not secret.
//!
//! Missing or unreadable state restarts the trial instead of locking the
//! user out.

use crate::error::LicenseResult;
use chrono::{DateTime, Duration, Utc};
use pocketwall_crypto::{EncryptedPackage, KdfParams, PasswordCipher, DEFAULT_ITERATIONS};
use pocketwall_types::{Clock, KeyValueStore, ProtectionConfig, StoreError, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Current trial state format.
pub const TRIAL_STATE_VERSION: u32 = 1;

/// Compiled-in key sealing the trial state.
const TRIAL_SYSTEM_KEY: &str = "pocketwall.trial.v1/5c1e0b7a-local-integrity";

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// What is persisted (encrypted) for the trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialState {
    pub start_time: DateTime<Utc>,
    pub version: u32,
}

/// Trial status at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatus {
    pub is_active: bool,
    /// Whole hours left, rounded up; zero once expired.
    pub remaining_hours: i64,
    pub is_expired: bool,
    pub start_time: DateTime<Utc>,
}

/// Tracks the evaluation window.
pub struct TrialClock {
    store: Arc<dyn KeyValueStore>,
    cipher: PasswordCipher,
    clock: Arc<dyn Clock>,
    storage_key: String,
    length: Duration,
}

impl TrialClock {
    /// Creates a trial clock over `store` using the system clock.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &ProtectionConfig) -> LicenseResult<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a trial clock with an explicit time source. Fails if the
    /// configuration is out of range.
    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        config: &ProtectionConfig,
        clock: Arc<dyn Clock>,
    ) -> LicenseResult<Self> {
        config.validate()?;
        let length = Duration::try_hours(config.trial_hours).ok_or_else(|| {
            StoreError::InvalidConfig(format!("trial_hours {} out of range", config.trial_hours))
        })?;

        Ok(Self {
            store,
            cipher: PasswordCipher::new(KdfParams::new(DEFAULT_ITERATIONS)),
            clock,
            storage_key: config.trial_storage_key.clone(),
            length,
        })
    }

    /// Length of the trial window.
    #[must_use]
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Reads the trial state, starting the trial if none is readable.
    pub async fn check_status(&self) -> LicenseResult<TrialStatus> {
        self.start_trial().await
    }

    /// Starts the trial if no readable state exists. An existing trial,
    /// active or expired, is left as it is and its status returned.
    pub async fn start_trial(&self) -> LicenseResult<TrialStatus> {
        match self.load().await? {
            Some(state) => Ok(self.status_at(state.start_time, self.clock.now())),
            None => self.begin().await,
        }
    }

    /// Restarts the trial, discarding any existing state. Administrative only.
    pub async fn reset_trial(&self) -> LicenseResult<TrialStatus> {
        warn!("Trial reset requested");
        self.begin().await
    }

    /// Moves the start time an hour past the end of the window.
    pub async fn expire_trial(&self) -> LicenseResult<TrialStatus> {
        let now = self.clock.now();
        let start = now - self.length - Duration::hours(1);
        self.write(start).await?;
        info!("Trial forced to expire");
        Ok(self.status_at(start, now))
    }

    async fn begin(&self) -> LicenseResult<TrialStatus> {
        let now = self.clock.now();
        self.write(now).await?;
        info!("Trial started at {now}");
        Ok(self.status_at(now, now))
    }

    async fn load(&self) -> LicenseResult<Option<TrialState>> {
        let Some(raw) = self.store.get(&self.storage_key)? else {
            debug!("No trial state found");
            return Ok(None);
        };

        let package = match EncryptedPackage::from_json(&raw) {
            Ok(package) => package,
            Err(e) => {
                warn!("Trial state unreadable, restarting trial: {e}");
                return Ok(None);
            }
        };

        match self
            .cipher
            .open_json_async::<TrialState>(package, TRIAL_SYSTEM_KEY.to_string())
            .await
        {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Trial state failed to decrypt, restarting trial: {e}");
                Ok(None)
            }
        }
    }

    async fn write(&self, start_time: DateTime<Utc>) -> LicenseResult<()> {
        let state = TrialState {
            start_time,
            version: TRIAL_STATE_VERSION,
        };
        let package = self
            .cipher
            .seal_json_async(&state, TRIAL_SYSTEM_KEY.to_string())
            .await?;
        self.store.set(&self.storage_key, &package.to_json()?)?;
        Ok(())
    }

    fn status_at(&self, start_time: DateTime<Utc>, now: DateTime<Utc>) -> TrialStatus {
        // A start time in the future counts as just started.
        let elapsed = (now - start_time).max(Duration::zero());
        let remaining = (self.length - elapsed).max(Duration::zero());
        let millis = remaining.num_milliseconds();
        let remaining_hours = (millis + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR;
        let is_expired = millis == 0;

        TrialStatus {
            is_active: !is_expired,
            remaining_hours,
            is_expired,
            start_time,
        }
    }
}
