//! Whole-data-store backups for PocketWall.
//!
//! A backup is a snapshot of everything the data store holds, stamped with
//! the owning account. It can be written as plain JSON or sealed with a
//! password. Restores refuse to overwrite one account's data with another
//! account's backup unless explicitly forced.

mod error;
mod legacy;
mod manager;
mod snapshot;

pub use error::{BackupError, BackupResult};
pub use manager::{
    BackupFile, BackupManager, BackupOptions, Decoding, RestoreReport, RestoreRequest, SaveOutcome,
};
pub use snapshot::{
    backup_filename, looks_encrypted, parse_backup, BackupMeta, BackupSnapshot, ParsedBackup,
    BACKUP_FILE_PREFIX, BACKUP_FORMAT_VERSION, ENCRYPTED_SUFFIX, PLAIN_SUFFIX,
};
