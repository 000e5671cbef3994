//! Core types shared across the crate: document addressing, write requests,
//! lifecycle phases, and the canonical list-document payload shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// DocKey
// ============================================================================

/// Composite address of one remote document: `(namespace, name)`.
///
/// The sole addressing scheme for cache entries. Composes into the remote
/// store path as `"{namespace}/{name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocKey {
    pub namespace: String,
    pub name: String,
}

impl DocKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The remote store path for this key.
    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// ============================================================================
// DocPhase
// ============================================================================

/// Lifecycle phase of a cached document, as observed by readers.
///
/// `Uninitialized` → `Loading` → `Synced` | `Error`. Once `Synced` is reached
/// the phase never reverts to `Loading`; an error after `Synced` keeps the
/// previously synced data visible alongside the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPhase {
    /// No cache entry exists for the key.
    Uninitialized,
    /// Entry created, no confirmed value yet.
    Loading,
    /// A confirmed value is present.
    Synced,
    /// The subscription channel reported an error.
    Error,
}

// ============================================================================
// DocWrite
// ============================================================================

/// Updater closure: receives the latest cached value (`None` when no entry
/// exists for the key) and produces the value to write.
pub type UpdateFn = dyn FnOnce(Option<&Value>) -> Value + Send;

/// A write request — either a literal replacement value or an updater applied
/// to the latest cached value at call time.
pub enum DocWrite {
    Replace(Value),
    Update(Box<UpdateFn>),
}

impl DocWrite {
    pub fn replace(value: impl Into<Value>) -> Self {
        Self::Replace(value.into())
    }

    pub fn update(f: impl FnOnce(Option<&Value>) -> Value + Send + 'static) -> Self {
        Self::Update(Box::new(f))
    }
}

impl fmt::Debug for DocWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(v) => f.debug_tuple("Replace").field(v).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
        }
    }
}

// ============================================================================
// Unsubscribe
// ============================================================================

/// An owned one-shot closure that removes a subscription when called.
///
/// `FnOnce` makes the more-than-once no-op contract structural: a consumed
/// handle cannot be invoked again.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

// ============================================================================
// ListDoc — canonical collection-shaped payload
// ============================================================================

/// A collection-shaped document: an ordered list of items, each carrying a
/// unique `"id"` string. Uniqueness is a caller-maintained invariant.
///
/// Reorders, inserts, and removals are expressed as wholesale list
/// replacement through the write path, never as in-place mutation of a
/// cached value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListDoc {
    #[serde(default)]
    pub items: Vec<Value>,
}

impl ListDoc {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// The `"id"` field of an item, if it is an object carrying one.
    pub fn item_id(item: &Value) -> Option<&str> {
        item.get("id").and_then(Value::as_str)
    }

    /// Index of the item with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|it| Self::item_id(it) == Some(id))
    }

    /// Replace the item with the same id in place, or append when absent.
    pub fn upsert(&mut self, item: Value) {
        match Self::item_id(&item).and_then(|id| self.position(id)) {
            Some(idx) => self.items[idx] = item,
            None => self.items.push(item),
        }
    }

    /// Remove the item with the given id. Returns whether an item was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move the item with the given id to `to` (clamped to the list length),
    /// shifting the items in between. Returns whether the item was found.
    pub fn move_item(&mut self, id: &str, to: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let item = self.items.remove(from);
        let to = to.min(self.items.len());
        self.items.insert(to, item);
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
