//! Process-wide change events and the typed emitter behind `on_change`.
//!
//! The emitter takes a snapshot of its listener list before firing, with the
//! lock released during callbacks, so listeners may register or deregister
//! from inside a callback:
//!   - a listener removed during a round is still called in that round;
//!   - a listener added during a round first fires on the next emit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RemoteError;
use crate::types::DocKey;

// ============================================================================
// DocEvent
// ============================================================================

/// A cache-wide event emitted after each applied remote push.
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    /// A confirmed value replaced the cached data for a key.
    Snapshot { key: DocKey },
    /// The subscription channel for a key reported an error.
    SubscriptionError { key: DocKey, error: RemoteError },
}

impl DocEvent {
    /// The document the event concerns.
    pub fn key(&self) -> &DocKey {
        match self {
            Self::Snapshot { key } => key,
            Self::SubscriptionError { key, .. } => key,
        }
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// Identifies one registered listener; pass to [`Emitter::off`] to remove it.
pub type ListenerId = u64;

/// Closure type for event listeners.
pub type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

struct Listener<T> {
    id: ListenerId,
    f: Arc<ListenerFn<T>>,
}

/// Minimal typed pub/sub. Listeners fire synchronously, in registration
/// order, against a snapshot of the list taken at the start of each emit.
pub struct Emitter<T> {
    slots: Mutex<Vec<Listener<T>>>,
    next_id: AtomicU64,
}

impl<T> Emitter<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `f`; the returned id deregisters it via [`Emitter::off`].
    pub fn on(&self, f: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.lock().push(Listener { id, f: Arc::new(f) });
        id
    }

    /// Remove the listener with the given id. Returns whether it was present.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|l| l.id != id);
        slots.len() != before
    }

    /// Fire `event` at every listener registered at the start of the call.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Arc<ListenerFn<T>>> = {
            let slots = self.slots.lock();
            slots.iter().map(|l| Arc::clone(&l.f)).collect()
        };
        for f in snapshot {
            f(event);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
