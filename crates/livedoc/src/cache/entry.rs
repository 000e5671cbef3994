//! CacheEntry — the local mirror of one remote document.

use std::sync::Arc;

use serde_json::Value;

use crate::error::RemoteError;
use crate::remote::RemoteUnsubscribe;
use crate::types::DocPhase;

/// Identifies one registered consumer callback within an entry.
pub type SubscriberId = u64;

/// Consumer notification callback. Carries no payload — consumers re-read
/// through the synchronous snapshot API after being pinged, per the
/// external-store binding contract.
pub type SubscriberFn = dyn Fn() + Send + Sync;

/// One registered consumer.
pub struct Subscriber {
    pub id: SubscriberId,
    pub notify: Arc<SubscriberFn>,
}

/// Per-document mutable record.
///
/// `data` is always replaced wholesale with a fresh `Arc`, never mutated in
/// place, so `Arc::ptr_eq` on two reads reliably detects change.
/// `remote_handle` is present exactly when `subscribers` is non-empty, modulo
/// the window while the controller's registration call is still returning.
pub struct CacheEntry {
    pub data: Arc<Value>,
    /// True from creation until the first confirmed value; never reverts.
    pub loading: bool,
    /// Subscription-channel error; sticky until the next successful snapshot.
    pub error: Option<RemoteError>,
    pub subscribers: Vec<Subscriber>,
    pub remote_handle: Option<RemoteUnsubscribe>,
    /// Stamped at creation; remote callbacks carry it so late pushes for a
    /// prior incarnation of the same key are discarded.
    pub generation: u64,
}

impl CacheEntry {
    pub fn new(generation: u64, initial: Arc<Value>) -> Self {
        Self {
            data: initial,
            loading: true,
            error: None,
            subscribers: Vec::new(),
            remote_handle: None,
            generation,
        }
    }

    /// Freeze the current subscriber set for one notification pass
    /// (Arc bumps only). Re-entrant subscribe/unsubscribe during the pass
    /// cannot affect the frozen list.
    pub fn snapshot_subscribers(&self) -> Vec<Arc<SubscriberFn>> {
        self.subscribers.iter().map(|s| Arc::clone(&s.notify)).collect()
    }

    /// Remove the subscriber with the given id. Returns whether it was present.
    pub fn remove_subscriber(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Lifecycle phase as observed by readers of this entry.
    pub fn phase(&self) -> DocPhase {
        if self.error.is_some() {
            DocPhase::Error
        } else if self.loading {
            DocPhase::Loading
        } else {
            DocPhase::Synced
        }
    }
}
