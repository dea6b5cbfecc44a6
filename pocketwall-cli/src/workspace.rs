//! File-backed collaborators rooted at a data directory.
//!
//! ```text
//! <data-dir>/config.json   ProtectionConfig (optional)
//! <data-dir>/data.json     application data (collections)
//! <data-dir>/state.json    key-value store: settings, trial state
//! ```

use anyhow::{Context, Result};
use pocketwall_backup::BackupManager;
use pocketwall_crypto::{KdfParams, PasswordCipher};
use pocketwall_license::TrialClock;
use pocketwall_types::{JsonFileDataStore, JsonFileStore, KvSettingsStore, ProtectionConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const CONFIG_FILE: &str = "config.json";
pub const DATA_FILE: &str = "data.json";
pub const STATE_FILE: &str = "state.json";

/// Platform data directory for PocketWall, or `./pocketwall` if unknown.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pocketwall")
}

/// Everything a command needs, opened from one data directory.
pub struct Workspace {
    data_dir: PathBuf,
    config: ProtectionConfig,
    state: Arc<JsonFileStore>,
    data: Arc<JsonFileDataStore>,
}

impl Workspace {
    /// Opens `data_dir`, loading `config.json` if present.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let config_path = data_dir.join(CONFIG_FILE);
        let config = ProtectionConfig::load(&config_path)
            .await
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        debug!("Using data directory {}", data_dir.display());

        Ok(Self {
            state: Arc::new(JsonFileStore::new(data_dir.join(STATE_FILE))),
            data: Arc::new(JsonFileDataStore::new(data_dir.join(DATA_FILE))),
            data_dir,
            config,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    /// Password cipher using the configured KDF cost.
    pub fn cipher(&self) -> PasswordCipher {
        PasswordCipher::new(KdfParams::new(self.config.kdf_iterations))
    }

    pub fn backups(&self) -> BackupManager {
        BackupManager::new(self.data.clone(), self.cipher())
    }

    pub fn settings(&self) -> KvSettingsStore<Arc<JsonFileStore>> {
        KvSettingsStore::new(self.state.clone(), self.config.settings_key.clone())
    }

    pub fn trial(&self) -> Result<TrialClock> {
        TrialClock::new(self.state.clone(), &self.config).context("failed to open trial clock")
    }
}
