//! Shared fixtures for backup tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use pocketwall_backup::BackupManager;
use pocketwall_crypto::{KdfParams, PasswordCipher};
use pocketwall_types::{DataMap, ManualClock, MemoryDataStore};
use serde_json::json;
use std::sync::Arc;

pub fn sample_data() -> DataMap {
    json!({
        "transactions": [
            {"id": "t1", "amount": -42.5, "category": "groceries", "date": "2025-03-01"},
            {"id": "t2", "amount": 2500, "category": "salary", "date": "2025-03-02"}
        ],
        "budgets": [{"category": "groceries", "limit": 400}],
        "settings": {"currency": "EUR", "theme": "dark"}
    })
    .as_object()
    .unwrap()
    .clone()
}

pub fn fast_cipher() -> PasswordCipher {
    PasswordCipher::new(KdfParams::new(1_000))
}

pub fn fixed_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
    ))
}

pub fn manager_with(store: Arc<MemoryDataStore>) -> BackupManager {
    BackupManager::with_clock(store, fast_cipher(), fixed_clock())
}

/// Manager over a store seeded with [`sample_data`].
pub fn seeded() -> (BackupManager, Arc<MemoryDataStore>) {
    let store = Arc::new(MemoryDataStore::with_data(sample_data()));
    (manager_with(Arc::clone(&store)), store)
}

/// Manager over an empty store, for the restore side.
pub fn empty() -> (BackupManager, Arc<MemoryDataStore>) {
    let store = Arc::new(MemoryDataStore::default());
    (manager_with(Arc::clone(&store)), store)
}
