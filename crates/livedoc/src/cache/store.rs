//! EntryStore — the key → entry map plus id allocation.
//!
//! A plain struct; the controller holds it behind `Arc<parking_lot::Mutex>`
//! and performs every compound operation under a single lock acquisition.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::types::DocKey;

use super::entry::{CacheEntry, SubscriberId};

/// Map of live cache entries. At most one entry exists per key.
pub struct EntryStore {
    entries: HashMap<DocKey, CacheEntry>,
    next_generation: u64,
    next_subscriber_id: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_generation: 1,
            next_subscriber_id: 1,
        }
    }

    /// Return the existing entry for `key`, or create one with `loading=true`
    /// and `data` set to `initial`. The flag reports whether an entry was
    /// created by this call.
    pub fn get_or_create(&mut self, key: &DocKey, initial: &Arc<Value>) -> (bool, &mut CacheEntry) {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(slot) => (false, slot.into_mut()),
            Entry::Vacant(slot) => {
                let generation = self.next_generation;
                self.next_generation += 1;
                (true, slot.insert(CacheEntry::new(generation, Arc::clone(initial))))
            }
        }
    }

    pub fn get(&self, key: &DocKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// The entry for `key`, only if it is still the incarnation stamped with
    /// `generation`. Remote callbacks use this so a late delivery can never
    /// touch a successor entry for the same key.
    pub fn get_mut_at(&mut self, key: &DocKey, generation: u64) -> Option<&mut CacheEntry> {
        self.entries
            .get_mut(key)
            .filter(|e| e.generation == generation)
    }

    /// Delete the entry. Called when its subscriber set has just emptied.
    pub fn remove(&mut self, key: &DocKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Allocate a process-unique subscriber id.
    pub fn alloc_subscriber_id(&mut self) -> SubscriberId {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        id
    }

    pub fn contains(&self, key: &DocKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}
