//! Backup creation and restore.

use crate::error::{BackupError, BackupResult};
use crate::legacy;
use crate::snapshot::{
    backup_filename, looks_encrypted, parse_backup, BackupMeta, BackupSnapshot, ParsedBackup,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use pocketwall_crypto::{CryptoError, EncryptedPackage, PasswordCipher};
use pocketwall_types::{Clock, DataStore, SaveTarget, SystemClock, UserId};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to back up and how.
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Encrypt the snapshot with `password`.
    pub encrypt: bool,
    /// Password for encrypted backups; ignored otherwise.
    pub password: String,
    /// Account the backup belongs to.
    pub user_id: UserId,
}

/// Backup content ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    /// Suggested filename.
    pub filename: String,
    /// File content: pretty JSON, or base64 of an encrypted package.
    pub content: String,
    /// Whether `content` is encrypted.
    pub encrypted: bool,
}

/// Result of handing a backup to the save target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Filename offered to the save target.
    pub filename: String,
    /// False when the user dismissed the save dialog.
    pub saved: bool,
    /// Whether the backup was encrypted.
    pub encrypted: bool,
}

/// Parameters for a restore.
#[derive(Debug, Clone, Default)]
pub struct RestoreRequest<'a> {
    /// Raw file content.
    pub content: &'a str,
    /// Original filename, if known; used to detect encryption.
    pub filename: Option<&'a str>,
    /// Password for encrypted backups.
    pub password: &'a str,
    /// Currently signed-in account; empty when signed out.
    pub current_user_id: &'a str,
    /// Restore even if the backup belongs to another account.
    pub force: bool,
}

/// How a backup's content was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    /// Plain JSON.
    Plaintext,
    /// Authenticated encrypted package.
    Encrypted,
    /// Pre-2.0 base64 encoding, unauthenticated.
    Legacy,
}

/// Summary of a completed restore.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    /// Metadata carried by the backup, if any.
    pub meta: Option<BackupMeta>,
    /// How the content was decoded.
    pub decoding: Decoding,
    /// Number of top-level collections imported.
    pub collections: usize,
    /// True if the ownership check was overridden.
    pub forced: bool,
}

/// Produces and consumes whole-data-store snapshots.
pub struct BackupManager {
    store: Arc<dyn DataStore>,
    cipher: PasswordCipher,
    clock: Arc<dyn Clock>,
}

impl BackupManager {
    /// Creates a manager over `store` using the system clock.
    pub fn new(store: Arc<dyn DataStore>, cipher: PasswordCipher) -> Self {
        Self::with_clock(store, cipher, Arc::new(SystemClock))
    }

    /// Creates a manager with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn DataStore>,
        cipher: PasswordCipher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cipher,
            clock,
        }
    }

    /// Builds backup content without writing it anywhere.
    pub async fn export(&self, options: &BackupOptions) -> BackupResult<BackupFile> {
        if options.encrypt && options.password.is_empty() {
            return Err(BackupError::PasswordRequired);
        }

        let now = self.clock.now();
        let snapshot = BackupSnapshot {
            meta: BackupMeta::new(options.user_id.clone(), options.encrypt, now),
            payload: self.store.get_all_data()?,
        };
        let filename = backup_filename(now, options.encrypt);

        let content = if options.encrypt {
            let package = self
                .cipher
                .seal_json_async(&snapshot, options.password.clone())
                .await?;
            STANDARD.encode(package.to_json()?)
        } else {
            serde_json::to_string_pretty(&snapshot)?
        };

        debug!(
            "Exported {} collections for {} ({} bytes)",
            snapshot.payload.len(),
            snapshot.meta.user_id,
            content.len()
        );

        Ok(BackupFile {
            filename,
            content,
            encrypted: options.encrypt,
        })
    }

    /// Builds a backup and hands it to `target`.
    ///
    /// Nothing is written if the options are invalid.
    pub async fn create_backup(
        &self,
        options: &BackupOptions,
        target: &dyn SaveTarget,
    ) -> BackupResult<SaveOutcome> {
        let file = self.export(options).await?;
        let saved = target.save(&file.content, &file.filename).await?;

        if saved {
            info!("Backup saved as {}", file.filename);
        } else {
            info!("Backup save cancelled ({})", file.filename);
        }

        Ok(SaveOutcome {
            filename: file.filename,
            saved,
            encrypted: file.encrypted,
        })
    }

    /// Decodes and parses a backup without importing it.
    pub async fn inspect(
        &self,
        content: &str,
        filename: Option<&str>,
        password: &str,
    ) -> BackupResult<(ParsedBackup, Decoding)> {
        let (value, decoding) = self.decode(content, filename, password).await?;
        Ok((parse_backup(value)?, decoding))
    }

    /// Restores a backup into the data store.
    ///
    /// All checks run before the importer is called, and the importer is
    /// called exactly once with the complete payload.
    pub async fn restore_backup(&self, request: RestoreRequest<'_>) -> BackupResult<RestoreReport> {
        let (parsed, decoding) = self
            .inspect(request.content, request.filename, request.password)
            .await?;

        let forced = check_ownership(&parsed, request.current_user_id, request.force)?;
        let collections = parsed.payload.len();

        self.store
            .import_data(parsed.payload)
            .map_err(|e| BackupError::RestoreFailed(e.to_string()))?;

        info!(
            "Restored {} collections ({:?}{})",
            collections,
            decoding,
            if forced { ", ownership overridden" } else { "" }
        );

        Ok(RestoreReport {
            meta: parsed.meta,
            decoding,
            collections,
            forced,
        })
    }

    async fn decode(
        &self,
        content: &str,
        filename: Option<&str>,
        password: &str,
    ) -> BackupResult<(Value, Decoding)> {
        if !looks_encrypted(content, filename) {
            let value = serde_json::from_str(content)
                .map_err(|e| BackupError::RestoreFailed(format!("invalid backup JSON: {e}")))?;
            return Ok((value, Decoding::Plaintext));
        }

        if password.is_empty() {
            return Err(BackupError::PasswordRequired);
        }

        match self.open_package(content, password).await {
            Ok(value) => Ok((value, Decoding::Encrypted)),
            Err(e) if !e.is_authentication_failure() => Err(e.into()),
            Err(e) => {
                debug!("Encrypted package did not open ({e}); trying legacy decoder");
                match legacy::decode(content) {
                    Some(value) => {
                        warn!("Restoring unauthenticated legacy backup");
                        Ok((value, Decoding::Legacy))
                    }
                    None => Err(BackupError::InvalidPasswordOrCorrupt),
                }
            }
        }
    }

    async fn open_package(&self, content: &str, password: &str) -> Result<Value, CryptoError> {
        let package = read_package(content)?;
        let plaintext = self
            .cipher
            .open_async(package, password.to_string())
            .await?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| CryptoError::MalformedPackage(format!("plaintext is not JSON: {e}")))
    }
}

/// Accepts either the package JSON itself or base64 of it.
fn read_package(content: &str) -> Result<EncryptedPackage, CryptoError> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        return EncryptedPackage::from_json(trimmed);
    }

    let compact: String = trimmed.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| CryptoError::MalformedPackage(format!("invalid base64: {e}")))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| CryptoError::MalformedPackage(format!("invalid UTF-8: {e}")))?;
    EncryptedPackage::from_json(&json)
}

/// Enforces account binding. Returns whether an override was applied.
fn check_ownership(parsed: &ParsedBackup, current_user_id: &str, force: bool) -> BackupResult<bool> {
    let owner = parsed.owner();
    let current = current_user_id.trim();

    if owner.is_anonymous() || current.is_empty() || owner.as_str() == current {
        return Ok(false);
    }

    if force {
        warn!(
            "Restoring backup owned by {} into account {} (forced)",
            owner, current
        );
        return Ok(true);
    }

    Err(BackupError::OwnershipMismatch {
        backup_owner: owner.to_string(),
        current_user: current.to_string(),
    })
}
