//! Backup file format.
//!
//! Current layout (format `2.0`):
//!
//! ```text
//! { "meta": { "version", "createdAt", "userId", "encrypted" }, "payload": { ... } }
//! ```
//!
//! Older exports put a `_meta` key next to the data collections. Both are
//! read; only the wrapper layout is written.

use crate::error::{BackupError, BackupResult};
use chrono::{DateTime, Utc};
use pocketwall_types::{DataMap, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format version written into new backups.
pub const BACKUP_FORMAT_VERSION: &str = "2.0";

/// Prefix of every suggested backup filename.
pub const BACKUP_FILE_PREFIX: &str = "pocketwall_backup_";

/// Suffix of plaintext backups.
pub const PLAIN_SUFFIX: &str = ".json";

/// Suffix of encrypted backups.
pub const ENCRYPTED_SUFFIX: &str = ".enc.pwb";

const LEGACY_META_KEY: &str = "_meta";

/// Metadata stored with every backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub encrypted: bool,
}

impl BackupMeta {
    /// Metadata for a backup taken now.
    #[must_use]
    pub fn new(user_id: UserId, encrypted: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            version: BACKUP_FORMAT_VERSION.to_string(),
            created_at,
            user_id,
            encrypted,
        }
    }
}

/// A full export: metadata plus the untouched data-store payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub meta: BackupMeta,
    pub payload: DataMap,
}

/// `_meta` block of older exports; every field was optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMeta {
    version: Option<String>,
    created_at: Option<DateTime<Utc>>,
    user_id: Option<String>,
    encrypted: Option<bool>,
}

/// A backup after parsing, whatever layout it came in.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBackup {
    /// Owner and format information, if the file carried any.
    pub meta: Option<BackupMeta>,
    /// Data to hand to the importer.
    pub payload: DataMap,
}

impl ParsedBackup {
    /// Owner recorded in the backup; anonymous when absent.
    #[must_use]
    pub fn owner(&self) -> UserId {
        self.meta
            .as_ref()
            .map(|m| m.user_id.clone())
            .unwrap_or_default()
    }
}

/// Parses decoded backup JSON in any supported layout.
pub fn parse_backup(value: Value) -> BackupResult<ParsedBackup> {
    let Value::Object(mut root) = value else {
        return Err(BackupError::RestoreFailed(
            "backup is not a JSON object".to_string(),
        ));
    };

    if is_wrapper(&root) {
        let snapshot: BackupSnapshot = serde_json::from_value(Value::Object(root))
            .map_err(|e| BackupError::RestoreFailed(format!("invalid backup wrapper: {e}")))?;
        return Ok(ParsedBackup {
            meta: Some(snapshot.meta),
            payload: snapshot.payload,
        });
    }

    let meta = match root.remove(LEGACY_META_KEY) {
        Some(raw) => {
            let legacy: LegacyMeta = serde_json::from_value(raw)
                .map_err(|e| BackupError::RestoreFailed(format!("invalid _meta block: {e}")))?;
            Some(BackupMeta {
                version: legacy.version.unwrap_or_else(|| "1.0".to_string()),
                created_at: legacy.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                user_id: UserId::from(legacy.user_id.as_deref()),
                encrypted: legacy.encrypted.unwrap_or(false),
            })
        }
        None => None,
    };

    Ok(ParsedBackup {
        meta,
        payload: root,
    })
}

/// The wrapper layout has exactly `meta` and `payload`, both objects.
fn is_wrapper(root: &DataMap) -> bool {
    root.len() == 2
        && root.get("meta").is_some_and(Value::is_object)
        && root.get("payload").is_some_and(Value::is_object)
}

/// Suggested filename for a backup taken at `at`.
#[must_use]
pub fn backup_filename(at: DateTime<Utc>, encrypted: bool) -> String {
    let stamp = at.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let suffix = if encrypted {
        ENCRYPTED_SUFFIX
    } else {
        PLAIN_SUFFIX
    };
    format!("{BACKUP_FILE_PREFIX}{stamp}{suffix}")
}

/// Decides whether file content is encrypted.
///
/// Plaintext backups are JSON objects and always start with `{`; encrypted
/// ones are base64 text. The filename suffix, when known, wins.
#[must_use]
pub fn looks_encrypted(content: &str, filename: Option<&str>) -> bool {
    filename.is_some_and(|f| f.ends_with(ENCRYPTED_SUFFIX))
        || !content.trim_start().starts_with('{')
}
