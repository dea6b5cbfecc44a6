//! Shared types for the PocketWall protection layer.
//!
//! This crate defines the seams between the protection components and the
//! rest of the application:
//! - Collaborator traits (data store, key-value store, settings, save target)
//! - Clock abstraction so time-dependent logic can be tested
//! - User identifiers and the `"anonymous"` sentinel
//! - Configuration shared by every component
//!
//! In-memory and JSON-file implementations of each trait live here too.

mod clock;
mod config;
mod file;
mod ids;
mod memory;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ProtectionConfig, MAX_KDF_ITERATIONS, MAX_TRIAL_HOURS};
pub use file::{DirectorySaveTarget, JsonFileDataStore, JsonFileStore};
pub use ids::{UserId, ANONYMOUS_USER};
pub use memory::{MemoryDataStore, MemoryKeyValueStore, MemorySaveTarget, SavedFile};
pub use store::{DataMap, DataStore, KeyValueStore, KvSettingsStore, SaveTarget, SettingsStore};

/// Result type for collaborator operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by storage collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("expected a JSON object at {0}")]
    NotAnObject(String),

    #[error("import rejected: {0}")]
    ImportRejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
