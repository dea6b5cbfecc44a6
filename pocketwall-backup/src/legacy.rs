//! Decoder for pre-2.0 "encrypted" backups.
//!
//! These were plain base64 of the backup JSON with no key and no
//! authentication. They can still be restored, but nothing about them is
//! trusted beyond being well-formed JSON.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;

/// Fields that identify an encrypted package rather than backup data.
const PACKAGE_FIELDS: [&str; 3] = ["ciphertext", "iv", "salt"];

/// Attempts the legacy decode. Returns `None` if the content is not a
/// base64-wrapped JSON object, or if it is actually an encrypted package
/// (which must never be imported as data).
pub fn decode(content: &str) -> Option<Value> {
    let compact: String = content.split_whitespace().collect();
    let bytes = STANDARD.decode(compact).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let value: Value = serde_json::from_str(&text).ok()?;

    let object = value.as_object()?;
    if PACKAGE_FIELDS.iter().all(|f| object.contains_key(*f)) {
        return None;
    }
    Some(value)
}
