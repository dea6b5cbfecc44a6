//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pocketwall_types::{KvSettingsStore, ManualClock, MemoryKeyValueStore};
use std::sync::Arc;

/// Key-value store key the settings object lives under in tests.
pub const SETTINGS_KEY: &str = "pocketwall_user_settings";

/// `PW-PRO-12M-K9QX-8D77`, computed independently.
pub const PRO_12M_KEY: &str = "PW-PRO-12M-K9QX-8D77";

/// `PW-STR-1M-ABCD-1E78`, computed independently.
pub const STARTER_1M_KEY: &str = "PW-STR-1M-ABCD-1E78";

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn clock_at(start: DateTime<Utc>) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start))
}

pub fn settings() -> KvSettingsStore<Arc<MemoryKeyValueStore>> {
    KvSettingsStore::new(Arc::new(MemoryKeyValueStore::new()), SETTINGS_KEY)
}
