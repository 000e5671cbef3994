//! EntryStore and CacheEntry tests — lifecycle bookkeeping below the
//! controller.

use std::sync::Arc;

use serde_json::{json, Value};

use livedoc::cache::{CacheEntry, EntryStore, Subscriber};
use livedoc::error::RemoteError;
use livedoc::types::{DocKey, DocPhase};

fn key() -> DocKey {
    DocKey::new("academic", "assignments")
}

fn initial() -> Arc<Value> {
    Arc::new(json!({"items": []}))
}

// ============================================================================
// get_or_create / remove
// ============================================================================

#[test]
fn get_or_create_builds_a_loading_entry_with_the_initial_value() {
    let mut store = EntryStore::new();
    let init = initial();

    let (created, entry) = store.get_or_create(&key(), &init);

    assert!(created);
    assert!(entry.loading);
    assert!(entry.error.is_none());
    assert!(entry.subscribers.is_empty());
    assert!(entry.remote_handle.is_none());
    assert!(Arc::ptr_eq(&entry.data, &init));
}

#[test]
fn get_or_create_reuses_the_existing_entry() {
    let mut store = EntryStore::new();
    let first_gen = {
        let (created, entry) = store.get_or_create(&key(), &initial());
        assert!(created);
        entry.loading = false;
        entry.generation
    };

    let other_initial = Arc::new(json!({"items": [1]}));
    let (created, entry) = store.get_or_create(&key(), &other_initial);

    assert!(!created);
    assert_eq!(entry.generation, first_gen);
    assert!(!entry.loading, "existing state untouched");
    assert_eq!(*entry.data, json!({"items": []}), "later initial ignored");
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_deletes_and_returns_the_entry() {
    let mut store = EntryStore::new();
    store.get_or_create(&key(), &initial());

    let removed = store.remove(&key());

    assert!(removed.is_some());
    assert!(store.is_empty());
    assert!(!store.contains(&key()));
    assert!(store.remove(&key()).is_none());
}

// ============================================================================
// Generations
// ============================================================================

#[test]
fn recreated_entries_get_a_new_generation() {
    let mut store = EntryStore::new();

    let (_, e1) = store.get_or_create(&key(), &initial());
    let g1 = e1.generation;
    store.remove(&key());
    let (_, e2) = store.get_or_create(&key(), &initial());

    assert!(e2.generation > g1);
}

#[test]
fn get_mut_at_rejects_a_stale_generation() {
    let mut store = EntryStore::new();
    let (_, entry) = store.get_or_create(&key(), &initial());
    let live_gen = entry.generation;
    store.remove(&key());
    store.get_or_create(&key(), &initial());

    assert!(store.get_mut_at(&key(), live_gen).is_none());
    let current_gen = store.get(&key()).unwrap().generation;
    assert!(store.get_mut_at(&key(), current_gen).is_some());
}

#[test]
fn subscriber_ids_are_unique_across_keys() {
    let mut store = EntryStore::new();
    let a = store.alloc_subscriber_id();
    let b = store.alloc_subscriber_id();
    let c = store.alloc_subscriber_id();
    assert!(a < b && b < c);
}

// ============================================================================
// CacheEntry
// ============================================================================

#[test]
fn entry_phase_tracks_loading_error_and_synced() {
    let mut entry = CacheEntry::new(1, initial());
    assert_eq!(entry.phase(), DocPhase::Loading);

    entry.loading = false;
    assert_eq!(entry.phase(), DocPhase::Synced);

    entry.error = Some(RemoteError::new("boom"));
    assert_eq!(entry.phase(), DocPhase::Error);

    entry.error = None;
    assert_eq!(entry.phase(), DocPhase::Synced);
}

#[test]
fn remove_subscriber_reports_presence() {
    let mut entry = CacheEntry::new(1, initial());
    entry.subscribers.push(Subscriber {
        id: 7,
        notify: Arc::new(|| {}),
    });

    assert!(entry.remove_subscriber(7));
    assert!(!entry.remove_subscriber(7));
    assert!(entry.subscribers.is_empty());
}

#[test]
fn snapshot_subscribers_is_a_frozen_copy() {
    let mut entry = CacheEntry::new(1, initial());
    entry.subscribers.push(Subscriber {
        id: 1,
        notify: Arc::new(|| {}),
    });
    entry.subscribers.push(Subscriber {
        id: 2,
        notify: Arc::new(|| {}),
    });

    let frozen = entry.snapshot_subscribers();
    entry.remove_subscriber(1);
    entry.remove_subscriber(2);

    assert_eq!(frozen.len(), 2, "snapshot unaffected by later removals");
}
