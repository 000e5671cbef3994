//! CacheController — the only component with behavior.
//!
//! Multiplexes any number of consumers onto exactly one remote subscription
//! per document, hands out referentially-stable snapshots, and routes writes
//! to the remote store without touching local state (the authoritative echo
//! through the open subscription is the sole source of truth for readers).
//!
//! # Threading model
//!
//! `CacheController` is `Send + Sync`. All entry mutations happen under one
//! `parking_lot::Mutex` over the [`EntryStore`]; the critical rule is that
//! **no lock is held while a subscriber callback, change listener, or remote
//! store method runs**. Notification passes iterate a frozen snapshot of the
//! subscriber list, so a notified consumer may subscribe or unsubscribe
//! re-entrantly without corrupting the pass.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{RemoteError, WriteError};
use crate::events::{DocEvent, Emitter};
use crate::remote::{DataCallback, ErrorCallback, RemoteDocumentStore};
use crate::types::{DocKey, DocPhase, DocWrite, Unsubscribe};

use super::entry::{Subscriber, SubscriberFn};
use super::store::EntryStore;

/// Shared real-time document cache.
///
/// Constructed once at process start and passed by `Arc` to every call site —
/// never a module-level global.
pub struct CacheController {
    remote: Arc<dyn RemoteDocumentStore>,
    state: Arc<Mutex<EntryStore>>,
    events: Arc<Emitter<DocEvent>>,
}

impl CacheController {
    pub fn new(remote: Arc<dyn RemoteDocumentStore>) -> Self {
        Self {
            remote,
            state: Arc::new(Mutex::new(EntryStore::new())),
            events: Arc::new(Emitter::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Subscription
    // -----------------------------------------------------------------------

    /// Register `notify` as an interested consumer for `key`, creating the
    /// cache entry (with `data = initial`, `loading = true`) if absent.
    ///
    /// Exactly one remote subscription is opened per key, on entry creation
    /// only — every further consumer shares it. The returned closure removes
    /// this consumer's interest; when the last consumer detaches, the entry
    /// is deleted and the remote subscription synchronously closed.
    pub fn subscribe_doc(
        &self,
        key: &DocKey,
        initial: Arc<Value>,
        notify: impl Fn() + Send + Sync + 'static,
    ) -> Unsubscribe {
        let notify: Arc<SubscriberFn> = Arc::new(notify);

        let (generation, sub_id, created) = {
            let mut store = self.state.lock();
            let sub_id = store.alloc_subscriber_id();
            let (created, entry) = store.get_or_create(key, &initial);
            entry.subscribers.push(Subscriber {
                id: sub_id,
                notify: Arc::clone(&notify),
            });
            (entry.generation, sub_id, created)
        };

        if created {
            self.open_remote(key, generation);
        }

        let state = Arc::clone(&self.state);
        let key = key.clone();
        Box::new(move || {
            let handle = {
                let mut store = state.lock();
                let emptied = match store.get_mut_at(&key, generation) {
                    Some(entry) => {
                        entry.remove_subscriber(sub_id);
                        entry.subscribers.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    store.remove(&key).and_then(|e| e.remote_handle)
                } else {
                    None
                }
            };
            if let Some(close) = handle {
                tracing::debug!(key = %key, "last subscriber detached; closing remote subscription");
                close();
            }
        })
    }

    /// Open the single remote subscription for a freshly created entry and
    /// stash its handle. The store may deliver the current value to the data
    /// callback before `subscribe` returns; if every consumer detached during
    /// that window the entry is already gone and the handle is closed on the
    /// spot instead of stored.
    fn open_remote(&self, key: &DocKey, generation: u64) {
        tracing::debug!(key = %key, "opening remote subscription");
        let on_data = self.make_on_data(key.clone(), generation);
        let on_error = self.make_on_error(key.clone(), generation);
        let handle = self.remote.subscribe(&key.path(), on_data, on_error);

        let orphaned = {
            let mut store = self.state.lock();
            match store.get_mut_at(key, generation) {
                Some(entry) => {
                    entry.remote_handle = Some(handle);
                    None
                }
                None => Some(handle),
            }
        };
        if let Some(close) = orphaned {
            tracing::debug!(key = %key, "entry gone before registration finished; closing remote subscription");
            close();
        }
    }

    fn make_on_data(&self, key: DocKey, generation: u64) -> DataCallback {
        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        Arc::new(move |value: Value| {
            let targets = {
                let mut store = state.lock();
                match store.get_mut_at(&key, generation) {
                    Some(entry) => {
                        entry.data = Arc::new(value);
                        entry.loading = false;
                        entry.error = None;
                        Some(entry.snapshot_subscribers())
                    }
                    None => None,
                }
            };
            let Some(targets) = targets else {
                tracing::warn!(key = %key, "discarding remote push for a document no longer cached");
                return;
            };
            emit_isolated(&events, DocEvent::Snapshot { key: key.clone() });
            for notify in targets {
                notify();
            }
        })
    }

    fn make_on_error(&self, key: DocKey, generation: u64) -> ErrorCallback {
        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        Arc::new(move |error: RemoteError| {
            let targets = {
                let mut store = state.lock();
                match store.get_mut_at(&key, generation) {
                    Some(entry) => {
                        // Stale data stays visible alongside the error.
                        entry.error = Some(error.clone());
                        Some(entry.snapshot_subscribers())
                    }
                    None => None,
                }
            };
            let Some(targets) = targets else {
                tracing::warn!(key = %key, "discarding remote error for a document no longer cached");
                return;
            };
            emit_isolated(
                &events,
                DocEvent::SubscriptionError {
                    key: key.clone(),
                    error,
                },
            );
            for notify in targets {
                notify();
            }
        })
    }

    // -----------------------------------------------------------------------
    // Synchronous reads
    // -----------------------------------------------------------------------

    /// The latest known value for `key`, or a clone of the caller's `initial`
    /// when no entry exists. Pure — never creates an entry.
    ///
    /// Referential stability: the identical `Arc` is returned until a genuine
    /// update replaces it, so `Arc::ptr_eq` across two calls detects change.
    pub fn get_doc_data(&self, key: &DocKey, initial: &Arc<Value>) -> Arc<Value> {
        let store = self.state.lock();
        match store.get(key) {
            Some(entry) => Arc::clone(&entry.data),
            None => Arc::clone(initial),
        }
    }

    /// Whether the first confirmed value is still pending. `false` when no
    /// entry exists.
    pub fn get_doc_loading(&self, key: &DocKey) -> bool {
        self.state.lock().get(key).is_some_and(|e| e.loading)
    }

    /// The sticky subscription-channel error, if any. `None` when no entry
    /// exists.
    pub fn get_doc_error(&self, key: &DocKey) -> Option<RemoteError> {
        self.state.lock().get(key).and_then(|e| e.error.clone())
    }

    /// State-machine projection for `key`.
    pub fn doc_phase(&self, key: &DocKey) -> DocPhase {
        self.state
            .lock()
            .get(key)
            .map_or(DocPhase::Uninitialized, |e| e.phase())
    }

    /// Whether a cache entry currently exists for `key`.
    pub fn has_doc(&self, key: &DocKey) -> bool {
        self.state.lock().contains(key)
    }

    /// Number of active consumers for `key`.
    pub fn subscriber_count(&self, key: &DocKey) -> usize {
        self.state.lock().get(key).map_or(0, |e| e.subscribers.len())
    }

    /// Number of live cache entries.
    pub fn cached_doc_count(&self) -> usize {
        self.state.lock().len()
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Write to `key` through the remote store.
    ///
    /// An updater runs against the latest cached value at call time (`None`
    /// when no entry exists), so relative updates stay correct under
    /// concurrent pushes. The resolved value goes to the remote store and
    /// nowhere else: local data is only ever updated by the authoritative
    /// echo arriving through the open subscription, and with zero subscribers
    /// the write is still issued with nothing observing it locally.
    ///
    /// A failed write is returned to the caller; it is never folded into the
    /// entry's subscription-channel `error`.
    pub async fn set_doc_data(&self, key: &DocKey, write: DocWrite) -> Result<(), WriteError> {
        let value = match write {
            DocWrite::Replace(value) => value,
            DocWrite::Update(f) => {
                let current = {
                    let store = self.state.lock();
                    store.get(key).map(|e| Arc::clone(&e.data))
                };
                // User closure runs outside the lock, against the value that
                // was latest when this call resolved it.
                f(current.as_deref())
            }
        };

        self.remote
            .write(&key.path(), value)
            .await
            .map_err(|source| WriteError::Rejected {
                path: key.path(),
                source,
            })
    }

    /// Write a literal value to `key`.
    pub async fn set_doc_value(
        &self,
        key: &DocKey,
        value: impl Into<Value> + Send,
    ) -> Result<(), WriteError> {
        self.set_doc_data(key, DocWrite::Replace(value.into())).await
    }

    /// Write the result of `f` applied to the latest cached value for `key`.
    pub async fn update_doc(
        &self,
        key: &DocKey,
        f: impl FnOnce(Option<&Value>) -> Value + Send + 'static,
    ) -> Result<(), WriteError> {
        self.set_doc_data(key, DocWrite::update(f)).await
    }

    // -----------------------------------------------------------------------
    // Change events
    // -----------------------------------------------------------------------

    /// Register a process-wide listener for every applied push and
    /// subscription error. Returns a closure that deregisters it.
    pub fn on_change(&self, callback: impl Fn(&DocEvent) + Send + Sync + 'static) -> Unsubscribe {
        let id = self.events.on(callback);
        let events = Arc::clone(&self.events);
        Box::new(move || {
            events.off(id);
        })
    }
}

/// Emit an event with listener panics contained, so a misbehaving `on_change`
/// listener can never prevent the subscriber fan-out that follows.
fn emit_isolated(events: &Emitter<DocEvent>, event: DocEvent) {
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        events.emit(&event);
    }));
}
