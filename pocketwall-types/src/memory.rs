//! In-memory collaborator implementations.

use crate::store::{DataMap, DataStore, KeyValueStore, SaveTarget};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Data store held in memory.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    data: Mutex<DataMap>,
    reject_imports: bool,
}

impl MemoryDataStore {
    /// Creates a store seeded with `data`.
    #[must_use]
    pub fn with_data(data: DataMap) -> Self {
        Self {
            data: Mutex::new(data),
            reject_imports: false,
        }
    }

    /// Creates a store whose imports always fail, leaving data untouched.
    #[must_use]
    pub fn rejecting_imports(data: DataMap) -> Self {
        Self {
            data: Mutex::new(data),
            reject_imports: true,
        }
    }

    /// Returns a copy of the current data.
    #[must_use]
    pub fn snapshot(&self) -> DataMap {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl DataStore for MemoryDataStore {
    fn get_all_data(&self) -> StoreResult<DataMap> {
        Ok(self.snapshot())
    }

    fn import_data(&self, data: DataMap) -> StoreResult<()> {
        if self.reject_imports {
            return Err(StoreError::ImportRejected("store is read-only".to_string()));
        }
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = data;
        Ok(())
    }
}

/// Key-value store held in memory.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// A file handed to a [`MemorySaveTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
    pub content: String,
}

/// Save target that records what it was given.
#[derive(Debug, Default)]
pub struct MemorySaveTarget {
    saved: Mutex<Vec<SavedFile>>,
    cancel: bool,
}

impl MemorySaveTarget {
    /// Creates a target that accepts every save.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a target that behaves like a dismissed save dialog.
    #[must_use]
    pub fn cancelling() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            cancel: true,
        }
    }

    /// Returns every file saved so far.
    #[must_use]
    pub fn saved(&self) -> Vec<SavedFile> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SaveTarget for MemorySaveTarget {
    async fn save(&self, content: &str, filename: &str) -> StoreResult<bool> {
        if self.cancel {
            return Ok(false);
        }
        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SavedFile {
                filename: filename.to_string(),
                content: content.to_string(),
            });
        Ok(true)
    }
}
