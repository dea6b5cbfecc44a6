//! Collaborator interfaces.
//!
//! The protection layer never touches application data directly. It talks to
//! these traits, which the host application implements over its real stores.

use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;

/// A JSON object: named collections and settings.
pub type DataMap = serde_json::Map<String, Value>;

/// The whole application data set, as one opaque object.
pub trait DataStore: Send + Sync {
    /// Returns every collection and setting.
    fn get_all_data(&self) -> StoreResult<DataMap>;

    /// Replaces local data with `data`.
    ///
    /// Implementations must be all-or-nothing: on error, local data is left
    /// as it was.
    fn import_data(&self, data: DataMap) -> StoreResult<()>;
}

/// Persistent string key-value store (settings, trial state).
///
/// Individual calls are atomic; concurrent writers to the same key resolve
/// as last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// The user settings object.
pub trait SettingsStore: Send + Sync {
    /// Returns the current settings object (empty if none saved yet).
    fn get_user_settings(&self) -> StoreResult<DataMap>;

    /// Merges `updates` into the settings object.
    fn update_user_settings(&self, updates: DataMap) -> StoreResult<()>;

    /// Removes the named fields from the settings object.
    fn remove_user_settings(&self, keys: &[&str]) -> StoreResult<()>;
}

/// Platform save dialog or download fallback.
#[async_trait]
pub trait SaveTarget: Send + Sync {
    /// Offers `content` to the user under the suggested `filename`.
    ///
    /// Returns `Ok(false)` when the user cancels.
    async fn save(&self, content: &str, filename: &str) -> StoreResult<bool>;
}

/// [`SettingsStore`] kept as one JSON object under a single key of a
/// [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct KvSettingsStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KvSettingsStore<S> {
    /// Wraps `store`, keeping settings under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Returns the underlying key-value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    fn write(&self, settings: &DataMap) -> StoreResult<()> {
        let json = serde_json::to_string(settings)?;
        self.store.set(&self.key, &json)
    }
}

impl<S: KeyValueStore> SettingsStore for KvSettingsStore<S> {
    fn get_user_settings(&self) -> StoreResult<DataMap> {
        match self.store.get(&self.key)? {
            None => Ok(DataMap::new()),
            Some(json) => match serde_json::from_str::<Value>(&json)? {
                Value::Object(map) => Ok(map),
                _ => Err(StoreError::NotAnObject(self.key.clone())),
            },
        }
    }

    fn update_user_settings(&self, updates: DataMap) -> StoreResult<()> {
        let mut settings = self.get_user_settings()?;
        settings.extend(updates);
        self.write(&settings)
    }

    fn remove_user_settings(&self, keys: &[&str]) -> StoreResult<()> {
        let mut settings = self.get_user_settings()?;
        for key in keys {
            settings.remove(*key);
        }
        self.write(&settings)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}
