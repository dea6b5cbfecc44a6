//! Licensing and the evaluation trial for PocketWall.
//!
//! This module handles:
//! - Offline license keys: generation and checksum validation
//! - Local activation records kept in user settings
//! - The 72-hour evaluation trial, persisted encrypted
//!
//! # License Key Format
//!
//! Keys are formatted as `PW-{tier}-{duration}-{batch}-{checksum}`, e.g.
//! `PW-PRO-12M-K9QX-8D77`. The checksum is a 16-bit rolling hash over the
//! other fields and a salt compiled into the binary.
//!
//! # Security
//!
//! Neither the checksum salt nor the trial key is secret: both ship in the
//! binary. They stop typos and casual edits, not a determined attacker.
//! Anyone who reads the binary can mint keys and reset the trial.

mod activation;
mod error;
mod key;
mod trial;

pub use activation::{
    activate, current_entitlement, deactivate, ActivationRecord, Entitlement,
    LICENSE_SETTINGS_KEYS,
};
pub use error::{KeyRejection, LicenseError, LicenseResult, INVALID_KEY_MESSAGE};
pub use key::{
    checksum, generate, validate, LicenseDuration, LicenseKey, LicenseTier, ValidationReport,
    BATCH_LEN, KEY_PREFIX,
};
pub use trial::{TrialClock, TrialState, TrialStatus, TRIAL_STATE_VERSION};
