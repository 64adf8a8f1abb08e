//! Integration test: config load, validation, storage, merge, service ingest and dashboard.

use authwatch::{
    alert::LogSink,
    config::{RepeatPolicy, ScorerConfig, WatchConfig, WindowConfig, MAX_RULE_SECS},
    error::{ConfigError, ValidationError, WatchError},
    events::{parse_timestamp, NewEvent, LOGIN_FAILED},
    model::AnomalyScorer,
    rules::WindowRule,
    service::WatchService,
    storage::{EventStore, SqliteStore},
};
use std::path::Path;
use std::sync::Arc;

fn service(store: Arc<dyn EventStore>) -> WatchService {
    WatchService::new(
        store,
        Arc::new(LogSink),
        WindowRule::new(WindowConfig::default()),
        AnomalyScorer::new(ScorerConfig::default()),
    )
}

#[test]
fn config_load_default() {
    let c = WatchConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.window.window_secs, 600);
    assert_eq!(c.window.threshold, 5);
    assert_eq!(c.scorer.contamination, 0.2);
    assert_eq!(c.scorer.seed, 42);
    assert!(c.alert.telegram_token.is_none());
    assert!(c.validate().is_ok());
}

#[test]
fn config_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"window":{"threshold":3,"repeat_policy":{"mode":"suppress","cooldown_secs":60}}}"#,
    )
    .unwrap();
    let c = WatchConfig::load(&path);
    assert_eq!(c.window.threshold, 3);
    assert_eq!(c.window.window_secs, 600);
    assert_eq!(
        c.window.repeat_policy,
        RepeatPolicy::Suppress { cooldown_secs: 60 }
    );
    assert_eq!(c.scorer.contamination, 0.2);
}

#[test]
fn config_rejects_out_of_range_contamination() {
    let mut c = WatchConfig::default();
    c.scorer.contamination = 0.7;
    assert!(c.validate().is_err());
    c.scorer.contamination = 0.0;
    assert!(c.validate().is_err());
}

#[test]
fn config_rejects_windows_and_cooldowns_beyond_a_year() {
    let mut c = WatchConfig::default();
    c.window.window_secs = 10_000_000_000_000;
    assert!(c.validate().is_err());

    let mut c = WatchConfig::default();
    c.window.repeat_policy = RepeatPolicy::Suppress {
        cooldown_secs: MAX_RULE_SECS + 1,
    };
    assert!(c.validate().is_err());

    let mut c = WatchConfig::default();
    c.window.window_secs = MAX_RULE_SECS;
    assert!(c.validate().is_ok());
}

#[test]
fn malformed_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        WatchConfig::try_load(&path),
        Err(ConfigError::Parse { .. })
    ));
    // The lenient loader still falls back to defaults.
    assert_eq!(WatchConfig::load(&path).window.threshold, 5);
    assert!(WatchConfig::try_load(&dir.path().join("absent.json")).is_ok());
}

#[test]
fn validation_rejects_missing_fields() {
    let input = NewEvent {
        actor_id: None,
        ..NewEvent::new("x", "login", "success")
    };
    assert_eq!(
        input.validate().unwrap_err(),
        ValidationError::MissingField("actor_id")
    );

    let blank = NewEvent::new("10.0.0.1", "  ", "success");
    assert_eq!(
        blank.validate().unwrap_err(),
        ValidationError::MissingField("event_type")
    );
}

#[test]
fn validation_normalizes_timestamp() {
    let ev = NewEvent::new("10.0.0.1", "login", "success")
        .at("2024-03-01T08:15:30Z")
        .validate()
        .unwrap();
    assert_eq!(ev.timestamp(), "2024-03-01 08:15:30");

    let bad = NewEvent::new("10.0.0.1", "login", "success").at("yesterday");
    assert!(matches!(
        bad.validate(),
        Err(ValidationError::InvalidTimestamp(_))
    ));
}

#[test]
fn missing_timestamp_is_stamped_with_local_time() {
    let ev = NewEvent::new("10.0.0.1", "login", "success").validate().unwrap();
    let stamped = parse_timestamp(ev.timestamp()).unwrap();
    let drift = chrono::Local::now().naive_local() - stamped;
    assert!(drift.num_seconds().abs() < 60);
}

#[test]
fn payload_accepts_legacy_names_and_rejects_unknown_fields() {
    let legacy: NewEvent =
        serde_json::from_str(r#"{"ip":"1.2.3.4","event":"login_failed","status":"failed"}"#)
            .unwrap();
    let ev = legacy.validate().unwrap();
    assert_eq!(ev.actor_id(), "1.2.3.4");
    assert_eq!(ev.event_type(), LOGIN_FAILED);

    let unknown = serde_json::from_str::<NewEvent>(
        r#"{"actor_id":"1.2.3.4","event_type":"login","status":"success","user":"bob"}"#,
    );
    assert!(unknown.is_err());
}

#[test]
fn storage_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.db");
    let store = SqliteStore::open(&path).unwrap();
    let ev = NewEvent::new("10.0.0.1", LOGIN_FAILED, "failed")
        .at("2024-03-01 10:00:00")
        .validate()
        .unwrap();
    let stored = store.insert(&ev).unwrap();
    assert_eq!(stored.timestamp, "2024-03-01 10:00:00");
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(
        store
            .count_events("10.0.0.1", LOGIN_FAILED, "2024-03-01 09:55:00", "2024-03-01 10:05:00")
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .count_events("10.0.0.1", LOGIN_FAILED, "2024-03-01 10:00:01", "2024-03-01 10:05:00")
            .unwrap(),
        0
    );
    assert_eq!(
        store
            .count_events("10.0.0.1", LOGIN_FAILED, "2024-03-01 09:50:00", "2024-03-01 09:59:59")
            .unwrap(),
        0
    );

    drop(store);
    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.all_events().unwrap(), vec![stored]);
}

#[test]
fn all_events_orders_by_timestamp_then_insertion() {
    let store = SqliteStore::in_memory().unwrap();
    for (actor, ts) in [("b", "2024-03-01 10:00:05"), ("a", "2024-03-01 10:00:00"), ("c", "2024-03-01 10:00:05")] {
        let ev = NewEvent::new(actor, "login", "success").at(ts).validate().unwrap();
        store.insert(&ev).unwrap();
    }
    let actors: Vec<String> = store
        .all_events()
        .unwrap()
        .into_iter()
        .map(|e| e.actor_id)
        .collect();
    assert_eq!(actors, vec!["a", "b", "c"]);
}

#[test]
fn merge_copies_events_from_other_database() {
    let dir = tempfile::tempdir().unwrap();
    let main_path = dir.path().join("main.db");
    let other_path = dir.path().join("instance").join("other.db");

    let main = SqliteStore::open(&main_path).unwrap();
    let other = SqliteStore::open(&other_path).unwrap();
    for i in 0..3 {
        let ev = NewEvent::new(format!("10.0.0.{i}"), "login", "success")
            .at("2024-03-01 10:00:00")
            .validate()
            .unwrap();
        other.insert(&ev).unwrap();
    }
    main.insert(
        &NewEvent::new("10.0.0.9", "login", "failed")
            .at("2024-03-01 09:00:00")
            .validate()
            .unwrap(),
    )
    .unwrap();
    drop(other);

    assert_eq!(main.merge_from(&other_path).unwrap(), 3);
    assert_eq!(main.len().unwrap(), 4);
}

#[test]
fn record_event_rejects_malformed_input_without_storing() {
    let store: Arc<dyn EventStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let svc = service(store.clone());
    let err = svc
        .record_event(NewEvent {
            status: None,
            ..NewEvent::new("10.0.0.1", "login", "success")
        })
        .unwrap_err();
    assert!(matches!(
        err,
        WatchError::Validation(ValidationError::MissingField("status"))
    ));
    assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn empty_store_yields_no_anomalies() {
    let svc = service(Arc::new(SqliteStore::in_memory().unwrap()));
    assert!(svc.compute_anomalies().is_empty());
    let board = svc.dashboard();
    assert!(board.hourly.is_empty());
    assert!(board.anomalies.is_empty());
}

#[test]
fn dashboard_groups_by_hour_type_and_actor() {
    let svc = service(Arc::new(SqliteStore::in_memory().unwrap()));
    for (actor, kind, ts) in [
        ("10.0.0.1", "login", "2024-03-01 10:05:00"),
        ("10.0.0.1", "admin_access", "2024-03-01 10:55:00"),
        ("10.0.0.2", "login", "2024-03-01 11:00:00"),
    ] {
        svc.record_event(NewEvent::new(actor, kind, "success").at(ts))
            .unwrap();
    }
    let board = svc.dashboard();
    assert_eq!(board.hourly.get("2024-03-01 10"), Some(&2));
    assert_eq!(board.hourly.get("2024-03-01 11"), Some(&1));
    assert_eq!(board.event_types.get("login"), Some(&2));
    assert_eq!(board.actors.get("10.0.0.1"), Some(&2));
    assert_eq!(board.anomalies.len(), 2);
}

#[test]
fn anomalies_serialize_with_numeric_labels() {
    let svc = service(Arc::new(SqliteStore::in_memory().unwrap()));
    svc.record_event(NewEvent::new("10.0.0.1", "login", "success").at("2024-03-01 10:00:00"))
        .unwrap();
    let json = serde_json::to_value(svc.compute_anomalies()).unwrap();
    let row = &json[0];
    assert_eq!(row["actor_id"], "10.0.0.1");
    assert_eq!(row["total_events"], 1);
    assert_eq!(row["anomaly_label"], 1);
    assert!(row.get("fail_ratio").is_some());
    assert!(row.get("avg_time_bin").is_some());
}
