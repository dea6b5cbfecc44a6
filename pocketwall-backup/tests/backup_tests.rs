mod common;

use base64::{engine::general_purpose::STANDARD, Engine};
use common::{empty, fast_cipher, fixed_clock, sample_data, seeded};
use pocketwall_backup::{
    BackupError, BackupManager, BackupOptions, Decoding, RestoreRequest, BACKUP_FORMAT_VERSION,
};
use pocketwall_crypto::{KdfParams, PasswordCipher};
use pocketwall_types::{DataStore, MemoryDataStore, MemorySaveTarget, UserId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn plain_for(user: &str) -> BackupOptions {
    BackupOptions {
        encrypt: false,
        password: String::new(),
        user_id: UserId::from(user),
    }
}

fn encrypted_for(user: &str, password: &str) -> BackupOptions {
    BackupOptions {
        encrypt: true,
        password: password.to_string(),
        user_id: UserId::from(user),
    }
}

// ── Create ───────────────────────────────────────────────────────

#[tokio::test]
async fn plaintext_backup_is_pretty_json_with_meta() {
    let (manager, _) = seeded();
    let file = manager.export(&plain_for("alice")).await.unwrap();

    assert_eq!(file.filename, "pocketwall_backup_2025-03-14T09-26-53-000Z.json");
    assert!(!file.encrypted);
    assert!(file.content.starts_with('{'));
    assert!(file.content.contains('\n'));

    let value: serde_json::Value = serde_json::from_str(&file.content).unwrap();
    assert_eq!(value["meta"]["version"], BACKUP_FORMAT_VERSION);
    assert_eq!(value["meta"]["userId"], "alice");
    assert_eq!(value["meta"]["encrypted"], false);
    assert_eq!(value["meta"]["createdAt"], "2025-03-14T09:26:53Z");
    assert_eq!(value["payload"], serde_json::Value::Object(sample_data()));
}

#[tokio::test]
async fn missing_user_is_recorded_as_anonymous() {
    let (manager, _) = seeded();
    let file = manager.export(&plain_for("")).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&file.content).unwrap();
    assert_eq!(value["meta"]["userId"], "anonymous");
}

#[tokio::test]
async fn encrypted_backup_hides_content() {
    let (manager, _) = seeded();
    let file = manager.export(&encrypted_for("alice", "s3cret")).await.unwrap();

    assert!(file.encrypted);
    assert!(file.filename.ends_with(".enc.pwb"));
    assert!(!file.content.starts_with('{'));
    assert!(!file.content.contains("groceries"));

    let package_json = String::from_utf8(STANDARD.decode(&file.content).unwrap()).unwrap();
    let package: serde_json::Value = serde_json::from_str(&package_json).unwrap();
    assert_eq!(package["version"], "1");
    assert!(package["ciphertext"].is_string());
}

#[tokio::test]
async fn encrypted_backup_without_password_writes_nothing() {
    let (manager, _) = seeded();
    let target = MemorySaveTarget::new();
    let err = manager
        .create_backup(&encrypted_for("alice", ""), &target)
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::PasswordRequired));
    assert!(target.saved().is_empty());
}

#[tokio::test]
async fn create_backup_hands_file_to_target() {
    let (manager, _) = seeded();
    let target = MemorySaveTarget::new();
    let outcome = manager
        .create_backup(&plain_for("alice"), &target)
        .await
        .unwrap();
    assert!(outcome.saved);

    let saved = target.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].filename, outcome.filename);
}

#[tokio::test]
async fn cancelled_save_is_reported() {
    let (manager, _) = seeded();
    let outcome = manager
        .create_backup(&plain_for("alice"), &MemorySaveTarget::cancelling())
        .await
        .unwrap();
    assert!(!outcome.saved);
}

// ── Restore round trips ──────────────────────────────────────────

#[tokio::test]
async fn plaintext_roundtrip_reproduces_data() {
    let (source, _) = seeded();
    let file = source.export(&plain_for("alice")).await.unwrap();

    let (target, store) = empty();
    let report = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            filename: Some(&file.filename),
            current_user_id: "alice",
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(store.snapshot(), sample_data());
    assert_eq!(report.decoding, Decoding::Plaintext);
    assert_eq!(report.collections, 3);
    assert!(!report.forced);
    assert_eq!(report.meta.unwrap().user_id, UserId::from("alice"));
}

#[tokio::test]
async fn encrypted_roundtrip_reproduces_data() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "s3cret")).await.unwrap();

    let (target, store) = empty();
    let report = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            filename: Some(&file.filename),
            password: "s3cret",
            current_user_id: "alice",
            force: false,
        })
        .await
        .unwrap();

    assert_eq!(store.snapshot(), sample_data());
    assert_eq!(report.decoding, Decoding::Encrypted);
    assert!(report.meta.unwrap().encrypted);
}

#[tokio::test]
async fn encrypted_backup_restores_under_different_kdf_cost() {
    let store = Arc::new(MemoryDataStore::with_data(sample_data()));
    let source = BackupManager::with_clock(
        store,
        PasswordCipher::new(KdfParams::new(2_000)),
        fixed_clock(),
    );
    let file = source.export(&encrypted_for("alice", "s3cret")).await.unwrap();

    let (target, restored) = empty();
    target
        .restore_backup(RestoreRequest {
            content: &file.content,
            filename: Some(&file.filename),
            password: "s3cret",
            current_user_id: "alice",
            force: false,
        })
        .await
        .unwrap();
    assert_eq!(restored.snapshot(), sample_data());
}

#[tokio::test]
async fn padded_owner_matches_current_user() {
    let (source, _) = seeded();
    let file = source.export(&plain_for(" alice ")).await.unwrap();

    let (target, store) = empty();
    let report = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            current_user_id: "alice",
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!report.forced);
    assert_eq!(report.meta.unwrap().user_id.as_str(), "alice");
    assert_eq!(store.snapshot(), sample_data());
}

#[tokio::test]
async fn encryption_is_detected_without_filename() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "pw")).await.unwrap();

    let (target, store) = empty();
    target
        .restore_backup(RestoreRequest {
            content: &file.content,
            password: "pw",
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(store.snapshot(), sample_data());
}

#[tokio::test]
async fn raw_package_json_is_accepted() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "pw")).await.unwrap();
    let package_json = String::from_utf8(STANDARD.decode(&file.content).unwrap()).unwrap();

    let (target, store) = empty();
    target
        .restore_backup(RestoreRequest {
            content: &package_json,
            filename: Some("export.enc.pwb"),
            password: "pw",
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(store.snapshot(), sample_data());
}

// ── Password failures ────────────────────────────────────────────

#[tokio::test]
async fn encrypted_restore_requires_password() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "pw")).await.unwrap();

    let (target, store) = empty();
    let err = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            filename: Some(&file.filename),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::PasswordRequired));
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn wrong_password_is_rejected_without_import() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "right")).await.unwrap();

    let (target, store) = empty();
    let err = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            filename: Some(&file.filename),
            password: "wrong",
            current_user_id: "alice",
            force: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::InvalidPasswordOrCorrupt));
    assert!(err.is_retryable());
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn corrupted_file_is_rejected() {
    let (target, store) = empty();
    let err = target
        .restore_backup(RestoreRequest {
            content: "this is not a backup",
            password: "pw",
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::InvalidPasswordOrCorrupt));
    assert!(store.snapshot().is_empty());
}

// ── Legacy formats ───────────────────────────────────────────────

#[tokio::test]
async fn legacy_base64_backup_still_restores() {
    let legacy_json = json!({
        "transactions": [{"id": "old", "amount": 1}],
        "_meta": {"version": "1.0", "userId": "alice", "encrypted": true}
    })
    .to_string();
    let content = STANDARD.encode(legacy_json);

    let (target, store) = empty();
    let report = target
        .restore_backup(RestoreRequest {
            content: &content,
            filename: Some("pocketwall_backup_2023.enc.pwb"),
            password: "anything",
            current_user_id: "alice",
            force: false,
        })
        .await
        .unwrap();

    assert_eq!(report.decoding, Decoding::Legacy);
    assert_eq!(
        serde_json::Value::Object(store.snapshot()),
        json!({"transactions": [{"id": "old", "amount": 1}]})
    );
}

#[tokio::test]
async fn legacy_flat_meta_layout_is_stripped() {
    let content = json!({
        "accounts": [{"id": "a1"}],
        "_meta": {"version": "1.5", "createdAt": "2024-01-01T00:00:00Z", "userId": "alice"}
    })
    .to_string();

    let (target, store) = empty();
    let report = target
        .restore_backup(RestoreRequest {
            content: &content,
            current_user_id: "alice",
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!store.snapshot().contains_key("_meta"));
    assert_eq!(report.meta.unwrap().version, "1.5");
}

#[tokio::test]
async fn legacy_meta_owner_is_still_enforced() {
    let content = json!({
        "accounts": [],
        "_meta": {"userId": "alice"}
    })
    .to_string();

    let (target, store) = empty();
    let err = target
        .restore_backup(RestoreRequest {
            content: &content,
            current_user_id: "bob",
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::OwnershipMismatch { .. }));
    assert!(store.snapshot().is_empty());
}

// ── Ownership binding ────────────────────────────────────────────

#[tokio::test]
async fn other_accounts_backup_is_rejected() {
    let (source, _) = seeded();
    let file = source.export(&plain_for("alice")).await.unwrap();

    let (target, store) = empty();
    let err = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            current_user_id: "bob",
            ..Default::default()
        })
        .await
        .unwrap_err();

    match &err {
        BackupError::OwnershipMismatch {
            backup_owner,
            current_user,
        } => {
            assert_eq!(backup_owner, "alice");
            assert_eq!(current_user, "bob");
        }
        other => panic!("expected OwnershipMismatch, got {other:?}"),
    }
    assert!(err.to_string().contains("alice"));
    assert!(err.to_string().contains("bob"));
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn forced_restore_overrides_ownership() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "pw")).await.unwrap();

    let (target, store) = empty();
    let report = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            filename: Some(&file.filename),
            password: "pw",
            current_user_id: "bob",
            force: true,
        })
        .await
        .unwrap();
    assert!(report.forced);
    assert_eq!(store.snapshot(), sample_data());
}

#[tokio::test]
async fn anonymous_backup_restores_into_any_account() {
    let (source, _) = seeded();
    let file = source.export(&plain_for("")).await.unwrap();

    let (target, store) = empty();
    target
        .restore_backup(RestoreRequest {
            content: &file.content,
            current_user_id: "bob",
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(store.snapshot(), sample_data());
}

#[tokio::test]
async fn signed_out_restore_skips_ownership_check() {
    let (source, _) = seeded();
    let file = source.export(&plain_for("alice")).await.unwrap();

    let (target, store) = empty();
    target
        .restore_backup(RestoreRequest {
            content: &file.content,
            current_user_id: "",
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(store.snapshot(), sample_data());
}

// ── Import failures ──────────────────────────────────────────────

#[tokio::test]
async fn import_failure_surfaces_as_restore_failed() {
    let (source, _) = seeded();
    let file = source.export(&plain_for("alice")).await.unwrap();

    let original = json!({"keep": true}).as_object().unwrap().clone();
    let store = Arc::new(MemoryDataStore::rejecting_imports(original.clone()));
    let target = BackupManager::with_clock(store.clone(), fast_cipher(), fixed_clock());

    let err = target
        .restore_backup(RestoreRequest {
            content: &file.content,
            current_user_id: "alice",
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::RestoreFailed(_)));
    assert_eq!(store.get_all_data().unwrap(), original);
}

#[tokio::test]
async fn malformed_plaintext_is_restore_failed() {
    let (target, _) = empty();
    let err = target
        .restore_backup(RestoreRequest {
            content: "{ not json",
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackupError::RestoreFailed(_)));
}

#[tokio::test]
async fn inspect_does_not_import() {
    let (source, _) = seeded();
    let file = source.export(&encrypted_for("alice", "pw")).await.unwrap();

    let (target, store) = empty();
    let (parsed, decoding) = target
        .inspect(&file.content, Some(&file.filename), "pw")
        .await
        .unwrap();
    assert_eq!(decoding, Decoding::Encrypted);
    assert_eq!(parsed.owner(), UserId::from("alice"));
    assert!(store.snapshot().is_empty());
}
