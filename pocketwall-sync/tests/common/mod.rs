//! Shared helpers for sync tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use pocketwall_sync::{MemoryRemoteStore, SyncController, SyncState, SyncStatus};
use pocketwall_types::{DataMap, ManualClock};
use serde_json::json;
use std::sync::{Arc, Mutex};

pub fn controller() -> (SyncController, Arc<MemoryRemoteStore>, Arc<ManualClock>) {
    let remote = Arc::new(MemoryRemoteStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap(),
    ));
    let controller = SyncController::with_clock(remote.clone(), clock.clone());
    (controller, remote, clock)
}

pub fn document(n: i64) -> DataMap {
    json!({"transactions": [{"id": n}]})
        .as_object()
        .unwrap()
        .clone()
}

/// Records every status a listener sees.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<SyncStatus>>>);

impl Recorder {
    pub fn listener(&self) -> impl Fn(&SyncStatus) + Send + Sync + 'static {
        let seen = Arc::clone(&self.0);
        move |status: &SyncStatus| seen.lock().unwrap().push(status.clone())
    }

    pub fn states(&self) -> Vec<SyncState> {
        self.0.lock().unwrap().iter().map(|s| s.state).collect()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<SyncStatus> {
        self.0.lock().unwrap().last().cloned()
    }
}
