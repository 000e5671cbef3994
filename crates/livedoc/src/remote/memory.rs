//! MemoryRemoteStore — an in-process [`RemoteDocumentStore`].
//!
//! Holds every document in memory and delivers echoes synchronously inside
//! `write().await`, which makes it the reference implementation for the
//! authoritative-echo contract: a write never touches a reader directly, it
//! lands in the document table and fans back out through the open
//! subscription channels. Used by tests and by offline/demo callers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::RemoteError;

use super::traits::{DataCallback, ErrorCallback, RemoteDocumentStore, RemoteUnsubscribe};

struct ChannelSub {
    id: u64,
    on_data: DataCallback,
    on_error: ErrorCallback,
}

struct MemoryInner {
    /// path → current document value
    documents: HashMap<String, Value>,
    /// path → open subscription channels
    channels: HashMap<String, Vec<ChannelSub>>,
    next_sub_id: u64,
    /// While `Some`, every write is rejected with a clone of this error.
    write_failure: Option<RemoteError>,
}

/// In-memory remote store with synchronous delivery.
///
/// Interior mutability via `parking_lot::Mutex`; the lock is never held while
/// a subscriber callback runs, so callbacks may re-enter the store.
pub struct MemoryRemoteStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                documents: HashMap::new(),
                channels: HashMap::new(),
                next_sub_id: 1,
                write_failure: None,
            })),
        }
    }

    /// Seed a document without notifying anyone — state that existed before
    /// the process connected.
    pub fn seed(&self, path: impl Into<String>, value: Value) {
        self.inner.lock().documents.insert(path.into(), value);
    }

    /// Deliver `value` for `path` as if another client's write was accepted:
    /// updates the document table and fans out to every open channel.
    /// Bypasses write-failure injection.
    pub fn push(&self, path: &str, value: Value) {
        let targets = {
            let mut inner = self.inner.lock();
            inner.documents.insert(path.to_string(), value.clone());
            data_callbacks(&inner, path)
        };
        for on_data in targets {
            on_data(value.clone());
        }
    }

    /// Deliver a subscription-channel error to every open channel for `path`.
    pub fn emit_error(&self, path: &str, error: RemoteError) {
        let targets: Vec<ErrorCallback> = {
            let inner = self.inner.lock();
            inner
                .channels
                .get(path)
                .map(|subs| subs.iter().map(|s| Arc::clone(&s.on_error)).collect())
                .unwrap_or_default()
        };
        for on_error in targets {
            on_error(error.clone());
        }
    }

    /// Reject all subsequent writes with a clone of `error`.
    pub fn fail_writes(&self, error: RemoteError) {
        self.inner.lock().write_failure = Some(error);
    }

    /// Stop rejecting writes.
    pub fn clear_write_failure(&self) {
        self.inner.lock().write_failure = None;
    }

    /// Number of open subscription channels for `path`.
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.inner
            .lock()
            .channels
            .get(path)
            .map_or(0, |subs| subs.len())
    }

    /// The current stored value for `path`.
    pub fn document(&self, path: &str) -> Option<Value> {
        self.inner.lock().documents.get(path).cloned()
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot the data callbacks for `path` (Arc bumps only).
fn data_callbacks(inner: &MemoryInner, path: &str) -> Vec<DataCallback> {
    inner
        .channels
        .get(path)
        .map(|subs| subs.iter().map(|s| Arc::clone(&s.on_data)).collect())
        .unwrap_or_default()
}

#[async_trait]
impl RemoteDocumentStore for MemoryRemoteStore {
    fn subscribe(
        &self,
        path: &str,
        on_data: DataCallback,
        on_error: ErrorCallback,
    ) -> RemoteUnsubscribe {
        let (id, current) = {
            let mut inner = self.inner.lock();
            let id = inner.next_sub_id;
            inner.next_sub_id += 1;
            inner.channels.entry(path.to_string()).or_default().push(ChannelSub {
                id,
                on_data: Arc::clone(&on_data),
                on_error,
            });
            (id, inner.documents.get(path).cloned())
        };

        // Stores deliver the current value synchronously when one exists.
        if let Some(value) = current {
            on_data(value);
        }

        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        Box::new(move || {
            let mut inner = inner.lock();
            if let Some(subs) = inner.channels.get_mut(&path) {
                subs.retain(|s| s.id != id);
                if subs.is_empty() {
                    inner.channels.remove(&path);
                }
            }
        })
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), RemoteError> {
        let targets = {
            let mut inner = self.inner.lock();
            if let Some(err) = inner.write_failure.clone() {
                return Err(err);
            }
            inner.documents.insert(path.to_string(), value.clone());
            data_callbacks(&inner, path)
        };

        // Authoritative echo: the accepted value flows back through every
        // open channel, including the writer's own.
        for on_data in targets {
            on_data(value.clone());
        }
        Ok(())
    }
}
