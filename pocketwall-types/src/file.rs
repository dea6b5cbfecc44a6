//! JSON-file-backed collaborators for headless use.

use crate::store::{DataMap, DataStore, KeyValueStore, SaveTarget};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Writes `contents` next to `path` and renames it into place.
fn write_atomic(path: &Path, contents: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_object(path: &Path) -> StoreResult<DataMap> {
    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(DataMap::new()),
        Ok(contents) => match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(path.display().to_string())),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DataMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Key-value store persisted as one JSON object of strings.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (lazily) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        read_object(&self.path)?
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k, s)),
                _ => Err(StoreError::NotAnObject(format!(
                    "{}#{k}",
                    self.path.display()
                ))),
            })
            .collect()
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        write_atomic(&self.path, &serde_json::to_string_pretty(entries)?)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)?;
        debug!("Wrote key {} to {}", key, self.path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Data store persisted as one JSON object.
#[derive(Debug)]
pub struct JsonFileDataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileDataStore {
    /// Opens (lazily) the data file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl DataStore for JsonFileDataStore {
    fn get_all_data(&self) -> StoreResult<DataMap> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        read_object(&self.path)
    }

    fn import_data(&self, data: DataMap) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let json = serde_json::to_string_pretty(&Value::Object(data))?;
        write_atomic(&self.path, &json)?;
        debug!("Imported data into {}", self.path.display());
        Ok(())
    }
}

/// Save target that drops files into a directory, like a browser download.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    /// Saves into `dir`, creating it on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path a file named `filename` would be written to.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

#[async_trait]
impl SaveTarget for DirectorySaveTarget {
    async fn save(&self, content: &str, filename: &str) -> StoreResult<bool> {
        if filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(StoreError::Unavailable(format!(
                "refusing to write outside {}: {filename}",
                self.dir.display()
            )));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(filename), content).await?;
        debug!("Saved {} into {}", filename, self.dir.display());
        Ok(true)
    }
}
