//! MemoryRemoteStore tests — synchronous delivery, echo semantics, and
//! failure injection.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use livedoc::error::{RemoteError, RemoteErrorKind};
use livedoc::remote::{DataCallback, ErrorCallback, MemoryRemoteStore, RemoteDocumentStore};

/// Helper: a data callback appending into a shared log.
fn data_log() -> (Arc<Mutex<Vec<Value>>>, DataCallback) {
    let log: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let cb: DataCallback = Arc::new(move |v| sink.lock().push(v));
    (log, cb)
}

fn error_log() -> (Arc<Mutex<Vec<RemoteError>>>, ErrorCallback) {
    let log: Arc<Mutex<Vec<RemoteError>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let cb: ErrorCallback = Arc::new(move |e| sink.lock().push(e));
    (log, cb)
}

fn noop_error() -> ErrorCallback {
    Arc::new(|_| {})
}

// ============================================================================
// Subscribe
// ============================================================================

#[test]
fn subscribe_delivers_a_seeded_value_synchronously() {
    let store = MemoryRemoteStore::new();
    store.seed("academic/settings", json!({"theme": "dark"}));

    let (log, on_data) = data_log();
    let _unsub = store.subscribe("academic/settings", on_data, noop_error());

    assert_eq!(*log.lock(), vec![json!({"theme": "dark"})]);
}

#[test]
fn subscribe_without_a_document_delivers_nothing_until_a_write() {
    let store = MemoryRemoteStore::new();

    let (log, on_data) = data_log();
    let _unsub = store.subscribe("academic/settings", on_data, noop_error());

    assert!(log.lock().is_empty());
    store.push("academic/settings", json!({"theme": "light"}));
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn unsubscribe_stops_delivery_and_drops_the_channel() {
    let store = MemoryRemoteStore::new();

    let (log, on_data) = data_log();
    let unsub = store.subscribe("academic/settings", on_data, noop_error());
    assert_eq!(store.subscriber_count("academic/settings"), 1);

    unsub();
    assert_eq!(store.subscriber_count("academic/settings"), 0);

    store.push("academic/settings", json!({"theme": "light"}));
    assert!(log.lock().is_empty());
}

// ============================================================================
// Write + echo
// ============================================================================

#[tokio::test]
async fn accepted_writes_echo_to_every_open_channel_including_the_writers() {
    let store = MemoryRemoteStore::new();

    let (log_a, on_data_a) = data_log();
    let (log_b, on_data_b) = data_log();
    let _ua = store.subscribe("academic/courses", on_data_a, noop_error());
    let _ub = store.subscribe("academic/courses", on_data_b, noop_error());

    store
        .write("academic/courses", json!({"items": ["algebra"]}))
        .await
        .unwrap();

    assert_eq!(*log_a.lock(), vec![json!({"items": ["algebra"]})]);
    assert_eq!(*log_b.lock(), vec![json!({"items": ["algebra"]})]);
    assert_eq!(
        store.document("academic/courses"),
        Some(json!({"items": ["algebra"]}))
    );
}

#[tokio::test]
async fn writes_to_other_paths_do_not_cross_channels() {
    let store = MemoryRemoteStore::new();

    let (log, on_data) = data_log();
    let _unsub = store.subscribe("academic/settings", on_data, noop_error());

    store
        .write("academic/courses", json!({"items": []}))
        .await
        .unwrap();

    assert!(log.lock().is_empty());
}

// ============================================================================
// Failure injection
// ============================================================================

#[tokio::test]
async fn injected_write_failure_rejects_and_preserves_the_document() {
    let store = MemoryRemoteStore::new();
    store.seed("academic/settings", json!({"theme": "dark"}));
    store.fail_writes(RemoteError::with_kind(
        "store offline",
        RemoteErrorKind::Unavailable,
    ));

    let (log, on_data) = data_log();
    let _unsub = store.subscribe("academic/settings", on_data, noop_error());
    // Seeded value arrives; the rejected write must add nothing.
    let err = store
        .write("academic/settings", json!({"theme": "light"}))
        .await
        .expect_err("write must fail");

    assert_eq!(err.message, "store offline");
    assert_eq!(store.document("academic/settings"), Some(json!({"theme": "dark"})));
    assert_eq!(log.lock().len(), 1);

    store.clear_write_failure();
    store
        .write("academic/settings", json!({"theme": "light"}))
        .await
        .unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[test]
fn emit_error_reaches_error_callbacks() {
    let store = MemoryRemoteStore::new();

    let (errors, on_error) = error_log();
    let (data, on_data) = data_log();
    let _unsub = store.subscribe("academic/settings", on_data, on_error);

    store.emit_error(
        "academic/settings",
        RemoteError::with_kind("no access", RemoteErrorKind::PermissionDenied),
    );

    assert_eq!(errors.lock().len(), 1);
    assert_eq!(errors.lock()[0].kind, RemoteErrorKind::PermissionDenied);
    assert!(data.lock().is_empty(), "errors never travel the data channel");
}
