//! Local license activation.
//!
//! Activation is purely local: the key is validated, an expiry is computed,
//! and the resulting record is merged into the user settings object. The
//! record is never re-derived afterwards.
//!
//! Expiry is informational. [`current_entitlement`] reports whether the
//! license has lapsed, but the record stays in place until [`deactivate`]
//! removes it.

use crate::error::{LicenseError, LicenseResult};
use crate::key::{LicenseDuration, LicenseKey, LicenseTier};
use chrono::{DateTime, Months, Utc};
use pocketwall_types::{Clock, DataMap, SettingsStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Settings fields owned by the activation record.
pub const LICENSE_SETTINGS_KEYS: [&str; 5] = [
    "licenseKey",
    "licenseTier",
    "licenseDuration",
    "licenseActivatedAt",
    "licenseExpiresAt",
];

/// The activation record as stored in user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRecord {
    pub license_key: String,
    pub license_tier: LicenseTier,
    pub license_duration: LicenseDuration,
    pub license_activated_at: DateTime<Utc>,
    pub license_expires_at: DateTime<Utc>,
}

impl ActivationRecord {
    /// Builds the record for `key` activated at `now`.
    ///
    /// Expiry adds calendar months, clamped to the end of shorter months
    /// (Jan 31 + 1M = Feb 28/29).
    pub fn new(key: &LicenseKey, now: DateTime<Utc>) -> LicenseResult<Self> {
        let expires_at = now
            .checked_add_months(Months::new(key.duration().months()))
            .ok_or_else(|| LicenseError::InvalidRecord("expiry out of range".to_string()))?;

        Ok(Self {
            license_key: key.to_string(),
            license_tier: key.tier(),
            license_duration: key.duration(),
            license_activated_at: now,
            license_expires_at: expires_at,
        })
    }

    fn to_settings(&self) -> LicenseResult<DataMap> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(LicenseError::InvalidRecord(
                "record did not serialize to an object".to_string(),
            )),
        }
    }

    /// Extracts the record from a settings object, if one is present.
    ///
    /// The stored tier and duration must agree with the stored key.
    pub fn from_settings(settings: &DataMap) -> LicenseResult<Option<Self>> {
        if !settings.contains_key(LICENSE_SETTINGS_KEYS[0]) {
            return Ok(None);
        }

        let fields: DataMap = LICENSE_SETTINGS_KEYS
            .iter()
            .filter_map(|k| settings.get(*k).map(|v| ((*k).to_string(), v.clone())))
            .collect();
        let record: Self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| LicenseError::InvalidRecord(e.to_string()))?;

        let key = LicenseKey::parse(&record.license_key)
            .map_err(|reason| LicenseError::InvalidRecord(format!("stored key: {reason}")))?;
        if key.tier() != record.license_tier || key.duration() != record.license_duration {
            return Err(LicenseError::InvalidRecord(
                "stored tier or duration does not match the key".to_string(),
            ));
        }

        Ok(Some(record))
    }
}

/// The active license as seen at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub tier: LicenseTier,
    pub duration: LicenseDuration,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `now >= expires_at`.
    pub expired: bool,
}

impl Entitlement {
    /// Returns true if the license tier covers `required`. Ignores expiry.
    #[must_use]
    pub fn includes(&self, required: LicenseTier) -> bool {
        self.tier.includes(required)
    }

    /// Whole days until expiry, zero once expired.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_days().max(0)
    }
}

/// Validates `key` and records the activation in user settings.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidKey`] without touching settings if the key
/// does not validate.
pub fn activate(
    key: &str,
    settings: &dyn SettingsStore,
    clock: &dyn Clock,
) -> LicenseResult<ActivationRecord> {
    let key = LicenseKey::parse(key).map_err(|reason| {
        warn!("Activation refused: {reason}");
        LicenseError::InvalidKey(reason)
    })?;

    let record = ActivationRecord::new(&key, clock.now())?;
    settings.update_user_settings(record.to_settings()?)?;

    info!(
        "Activated {} license ({}), expires {}",
        record.license_tier, record.license_duration, record.license_expires_at
    );
    Ok(record)
}

/// Reads the current activation back from user settings.
///
/// Returns `Ok(None)` if no license was ever activated.
pub fn current_entitlement(
    settings: &dyn SettingsStore,
    clock: &dyn Clock,
) -> LicenseResult<Option<Entitlement>> {
    let Some(record) = ActivationRecord::from_settings(&settings.get_user_settings()?)? else {
        return Ok(None);
    };

    Ok(Some(Entitlement {
        tier: record.license_tier,
        duration: record.license_duration,
        activated_at: record.license_activated_at,
        expires_at: record.license_expires_at,
        expired: clock.now() >= record.license_expires_at,
    }))
}

/// Removes the activation record. Returns whether one was present.
pub fn deactivate(settings: &dyn SettingsStore) -> LicenseResult<bool> {
    let present = settings
        .get_user_settings()?
        .contains_key(LICENSE_SETTINGS_KEYS[0]);
    if present {
        settings.remove_user_settings(&LICENSE_SETTINGS_KEYS)?;
        info!("License deactivated");
    }
    Ok(present)
}
