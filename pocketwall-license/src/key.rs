//! License key generation and validation.
//!
//! Keys use the format `PW-{tier}-{duration}-{batch}-{checksum}`:
//! - `tier`: `STR`, `PRO` or `ELT`
//! - `duration`: `1M`, `3M`, `6M` or `12M`
//! - `batch`: four random uppercase alphanumerics
//! - `checksum`: four uppercase hex digits
//!
//! The checksum hashes `{tier}-{duration}-{batch}-{salt}` with
//! `h = h * 31 + c` in wrapping 32-bit signed arithmetic, then takes the
//! absolute value modulo `0x10000`. Generation and validation share
//! [`checksum`], so they cannot drift apart.

use crate::error::{KeyRejection, LicenseError, LicenseResult, INVALID_KEY_MESSAGE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First segment of every key.
pub const KEY_PREFIX: &str = "PW";

/// Length of the batch segment.
pub const BATCH_LEN: usize = 4;

/// Compiled-in checksum salt. Readable by anyone with the binary.
const CHECKSUM_SALT: &str = "PWALL-OFFLINE-7Q2M";

const BATCH_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// License tier, ordered from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Starter,
    Pro,
    Elite,
}

impl LicenseTier {
    /// Every tier, lowest first.
    pub const ALL: [Self; 3] = [Self::Starter, Self::Pro, Self::Elite];

    /// Three-letter code used in keys.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Starter => "STR",
            Self::Pro => "PRO",
            Self::Elite => "ELT",
        }
    }

    /// Looks up a tier by its key code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Lowercase tier name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Elite => "elite",
        }
    }

    /// Returns true if this tier grants everything `required` grants.
    #[must_use]
    pub fn includes(&self, required: LicenseTier) -> bool {
        *self >= required
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LicenseTier {
    type Err = LicenseError;

    /// Parses a tier name (`starter`, `pro`, `elite`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| LicenseError::UnknownTierName(s.to_string()))
    }
}

/// License duration in calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LicenseDuration {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "12M")]
    TwelveMonths,
}

impl LicenseDuration {
    /// Every duration, shortest first.
    pub const ALL: [Self; 4] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::TwelveMonths,
    ];

    /// Code used in keys.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::TwelveMonths => "12M",
        }
    }

    /// Looks up a duration by its key code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    /// Number of calendar months granted.
    #[must_use]
    pub fn months(&self) -> u32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
        }
    }
}

impl fmt::Display for LicenseDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LicenseDuration {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(&s.trim().to_ascii_uppercase())
            .ok_or_else(|| LicenseError::UnknownDurationName(s.to_string()))
    }
}

/// Computes the checksum segment for the given fields.
#[must_use]
pub fn checksum(tier: LicenseTier, duration: LicenseDuration, batch: &str) -> String {
    checksum_of(tier.code(), duration.code(), batch)
}

fn checksum_of(tier_code: &str, duration_code: &str, batch: &str) -> String {
    let input = format!("{tier_code}-{duration_code}-{batch}-{CHECKSUM_SALT}");
    let hash = input
        .chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32));
    // Widen before abs so i32::MIN has a positive counterpart.
    format!("{:04X}", i64::from(hash).abs() % 0x10000)
}

/// A well-formed license key with a valid checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LicenseKey {
    tier: LicenseTier,
    duration: LicenseDuration,
    batch: String,
    checksum: String,
}

impl LicenseKey {
    /// Generates a key with a random batch id.
    #[must_use]
    pub fn generate(tier: LicenseTier, duration: LicenseDuration) -> Self {
        let mut rng = rand::thread_rng();
        let batch: String = (0..BATCH_LEN)
            .map(|_| char::from(BATCH_ALPHABET[rng.gen_range(0..BATCH_ALPHABET.len())]))
            .collect();
        Self::assemble(tier, duration, batch)
    }

    /// Builds the key for a specific batch id.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidBatch`] unless `batch` is exactly four
    /// uppercase ASCII letters or digits.
    pub fn with_batch(
        tier: LicenseTier,
        duration: LicenseDuration,
        batch: &str,
    ) -> LicenseResult<Self> {
        let well_formed = batch.len() == BATCH_LEN
            && batch
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !well_formed {
            return Err(LicenseError::InvalidBatch(batch.to_string()));
        }
        Ok(Self::assemble(tier, duration, batch.to_string()))
    }

    fn assemble(tier: LicenseTier, duration: LicenseDuration, batch: String) -> Self {
        let checksum = checksum(tier, duration, &batch);
        Self {
            tier,
            duration,
            batch,
            checksum,
        }
    }

    /// Parses and checks a key. Input is trimmed and case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns the first check that failed, in order: segment count, prefix,
    /// tier, duration, checksum.
    pub fn parse(key: &str) -> Result<Self, KeyRejection> {
        let normalized = key.trim().to_uppercase();
        let segments: Vec<&str> = normalized.split('-').collect();
        let [prefix, tier_code, duration_code, batch, checksum] = segments[..] else {
            return Err(KeyRejection::InvalidFormat);
        };

        if prefix != KEY_PREFIX {
            return Err(KeyRejection::InvalidPrefix);
        }
        let tier = LicenseTier::from_code(tier_code).ok_or(KeyRejection::UnknownTier)?;
        let duration =
            LicenseDuration::from_code(duration_code).ok_or(KeyRejection::UnknownDuration)?;

        if checksum_of(tier_code, duration_code, batch) != checksum {
            return Err(KeyRejection::InvalidChecksum);
        }

        Ok(Self {
            tier,
            duration,
            batch: batch.to_string(),
            checksum: checksum.to_string(),
        })
    }

    /// Returns the tier.
    #[must_use]
    pub fn tier(&self) -> LicenseTier {
        self.tier
    }

    /// Returns the duration.
    #[must_use]
    pub fn duration(&self) -> LicenseDuration {
        self.duration
    }

    /// Returns the batch id.
    #[must_use]
    pub fn batch(&self) -> &str {
        &self.batch
    }

    /// Returns the checksum segment.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{KEY_PREFIX}-{}-{}-{}-{}",
            self.tier.code(),
            self.duration.code(),
            self.batch,
            self.checksum
        )
    }
}

impl FromStr for LicenseKey {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s)?)
    }
}

/// Outcome of [`validate`]. Never an error: rejected keys carry the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<LicenseTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<LicenseDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<KeyRejection>,
}

impl ValidationReport {
    /// Message to show the user, if the key was rejected.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        (!self.is_valid).then_some(INVALID_KEY_MESSAGE)
    }
}

/// Generates a key string for `tier` and `duration`.
#[must_use]
pub fn generate(tier: LicenseTier, duration: LicenseDuration) -> String {
    LicenseKey::generate(tier, duration).to_string()
}

/// Validates a key string.
#[must_use]
pub fn validate(key: &str) -> ValidationReport {
    match LicenseKey::parse(key) {
        Ok(parsed) => ValidationReport {
            is_valid: true,
            tier: Some(parsed.tier),
            duration: Some(parsed.duration),
            error: None,
        },
        Err(reason) => {
            tracing::debug!("License key rejected: {reason}");
            ValidationReport {
                is_valid: false,
                tier: None,
                duration: None,
                error: Some(reason),
            }
        }
    }
}
