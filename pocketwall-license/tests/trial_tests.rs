mod common;

use chrono::Duration;
use common::{at, clock_at};
use pocketwall_crypto::PasswordCipher;
use pocketwall_license::{LicenseError, TrialClock, TrialStatus};
use pocketwall_types::{
    KeyValueStore, ManualClock, MemoryKeyValueStore, ProtectionConfig, StoreError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const TRIAL_KEY: &str = "pocketwall_trial_state";

fn trial(store: &Arc<MemoryKeyValueStore>, clock: &Arc<ManualClock>) -> TrialClock {
    TrialClock::with_clock(store.clone(), &ProtectionConfig::default(), clock.clone()).unwrap()
}

fn fixture() -> (TrialClock, Arc<MemoryKeyValueStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryKeyValueStore::new());
    let clock = clock_at(at(2025, 5, 1, 9));
    (trial(&store, &clock), store, clock)
}

#[tokio::test]
async fn first_check_starts_full_trial() {
    let (trial, store, _) = fixture();
    assert!(store.get(TRIAL_KEY).unwrap().is_none());

    let status = trial.check_status().await.unwrap();
    assert_eq!(
        status,
        TrialStatus {
            is_active: true,
            remaining_hours: 72,
            is_expired: false,
            start_time: at(2025, 5, 1, 9),
        }
    );
    assert!(store.get(TRIAL_KEY).unwrap().is_some());
}

#[tokio::test]
async fn trial_counts_down_then_expires() {
    let (trial, _, clock) = fixture();
    trial.check_status().await.unwrap();

    clock.advance(Duration::hours(24));
    assert_eq!(trial.check_status().await.unwrap().remaining_hours, 48);

    clock.advance(Duration::hours(47) + Duration::minutes(30));
    let almost = trial.check_status().await.unwrap();
    assert!(almost.is_active);
    assert_eq!(almost.remaining_hours, 1);

    clock.advance(Duration::minutes(30));
    let ended = trial.check_status().await.unwrap();
    assert!(ended.is_expired);
    assert!(!ended.is_active);
    assert_eq!(ended.remaining_hours, 0);
}

#[tokio::test]
async fn trial_is_expired_after_73_hours() {
    let (trial, _, clock) = fixture();
    let started = trial.check_status().await.unwrap();
    assert_eq!(started.remaining_hours, 72);

    clock.advance(Duration::hours(73));
    let status = trial.check_status().await.unwrap();
    assert!(status.is_expired);
    assert_eq!(status.remaining_hours, 0);
    assert_eq!(status.start_time, started.start_time);
}

#[tokio::test]
async fn state_survives_new_instances() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let clock = clock_at(at(2025, 5, 1, 9));
    trial(&store, &clock).check_status().await.unwrap();

    clock.advance(Duration::hours(10));
    let status = trial(&store, &clock).check_status().await.unwrap();
    assert_eq!(status.start_time, at(2025, 5, 1, 9));
    assert_eq!(status.remaining_hours, 62);
}

#[tokio::test]
async fn expire_trial_forces_expiry() {
    let (trial, _, _) = fixture();
    trial.check_status().await.unwrap();

    let forced = trial.expire_trial().await.unwrap();
    assert!(forced.is_expired);
    assert_eq!(forced.start_time, at(2025, 4, 28, 8));

    assert!(trial.check_status().await.unwrap().is_expired);
}

#[tokio::test]
async fn start_trial_does_not_extend_running_trial() {
    let (trial, _, clock) = fixture();
    trial.check_status().await.unwrap();
    clock.advance(Duration::hours(70));

    let status = trial.start_trial().await.unwrap();
    assert_eq!(status.remaining_hours, 2);
    assert_eq!(status.start_time, at(2025, 5, 1, 9));
    assert_eq!(trial.check_status().await.unwrap().remaining_hours, 2);
}

#[tokio::test]
async fn start_trial_does_not_revive_expired_trial() {
    let (trial, _, clock) = fixture();
    trial.check_status().await.unwrap();
    clock.advance(Duration::hours(90));

    assert!(trial.start_trial().await.unwrap().is_expired);
    assert!(trial.check_status().await.unwrap().is_expired);
}

#[tokio::test]
async fn start_trial_begins_when_no_state_exists() {
    let (trial, store, _) = fixture();
    let status = trial.start_trial().await.unwrap();
    assert_eq!(status.remaining_hours, 72);
    assert!(store.get(TRIAL_KEY).unwrap().is_some());
}

#[tokio::test]
async fn reset_restarts_window() {
    let (trial, _, clock) = fixture();
    trial.check_status().await.unwrap();
    clock.advance(Duration::hours(100));
    assert!(trial.check_status().await.unwrap().is_expired);

    let reset = trial.reset_trial().await.unwrap();
    assert_eq!(reset.remaining_hours, 72);
    assert_eq!(reset.start_time, at(2025, 5, 5, 13));
    assert!(trial.check_status().await.unwrap().is_active);
}

#[tokio::test]
async fn concurrent_resets_leave_valid_state() {
    let (trial, _, _) = fixture();
    let (a, b) = tokio::join!(trial.reset_trial(), trial.reset_trial());
    a.unwrap();
    b.unwrap();

    let status = trial.check_status().await.unwrap();
    assert!(status.is_active);
    assert_eq!(status.remaining_hours, 72);
}

#[tokio::test]
async fn stored_state_is_not_plaintext() {
    let (trial, store, _) = fixture();
    trial.check_status().await.unwrap();

    let raw = store.get(TRIAL_KEY).unwrap().unwrap();
    assert!(!raw.contains("2025"));
    assert!(!raw.contains("startTime"));
    let package: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(package["ciphertext"].is_string());
}

#[tokio::test]
async fn garbage_state_restarts_trial() {
    let (trial, store, clock) = fixture();
    trial.check_status().await.unwrap();
    clock.advance(Duration::hours(80));

    store.set(TRIAL_KEY, "{\"startTime\":\"2099-01-01T00:00:00Z\"}").unwrap();
    let status = trial.check_status().await.unwrap();
    assert!(status.is_active);
    assert_eq!(status.remaining_hours, 72);
    assert_eq!(status.start_time, at(2025, 5, 4, 17));
}

#[tokio::test]
async fn state_sealed_with_another_key_restarts_trial() {
    let (trial, store, _) = fixture();
    let forged = PasswordCipher::default()
        .seal_json(
            &serde_json::json!({"startTime": "2099-01-01T00:00:00Z", "version": 1}),
            "guessed-key",
        )
        .unwrap();
    store.set(TRIAL_KEY, &forged.to_json().unwrap()).unwrap();

    let status = trial.check_status().await.unwrap();
    assert_eq!(status.start_time, at(2025, 5, 1, 9));
    assert_eq!(status.remaining_hours, 72);
}

#[tokio::test]
async fn trial_length_follows_config() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let clock = clock_at(at(2025, 5, 1, 9));
    let config = ProtectionConfig {
        trial_hours: 24,
        ..ProtectionConfig::default()
    };
    let trial = TrialClock::with_clock(store, &config, clock.clone()).unwrap();
    assert_eq!(trial.length(), Duration::hours(24));
    assert_eq!(trial.check_status().await.unwrap().remaining_hours, 24);
}

#[test]
fn out_of_range_trial_length_is_rejected() {
    for hours in [i64::MAX, 0, -5] {
        let config = ProtectionConfig {
            trial_hours: hours,
            ..ProtectionConfig::default()
        };
        let result = TrialClock::new(Arc::new(MemoryKeyValueStore::new()), &config);
        assert!(
            matches!(result, Err(LicenseError::Store(StoreError::InvalidConfig(_)))),
            "trial_hours {hours} accepted"
        );
    }
}

#[tokio::test]
async fn status_serializes_camel_case() {
    let (trial, _, _) = fixture();
    let status = trial.check_status().await.unwrap();
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json["isActive"], true);
    assert_eq!(json["remainingHours"], 72);
    assert_eq!(json["isExpired"], false);
    assert_eq!(json["startTime"], "2025-05-01T09:00:00Z");
}
