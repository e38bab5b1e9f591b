//! Cache Store Module
//!
//! Single-threaded LRU engine: a key index over an arena-backed recency list.

use std::collections::HashMap;

use bytes::Bytes;

use crate::cache::lru::RecencyList;
use crate::cache::{CacheEntry, CacheStats};

/// Upper bound on slots reserved up front, whatever the configured capacity.
const MAX_PREALLOCATED: usize = 4096;

// == Cache Store ==
/// Fixed-capacity key-value store with least-recently-used eviction.
///
/// The index maps each resident key to its slot in the recency list. Both
/// structures are always updated together, so `len()` is the size of either.
#[derive(Debug)]
pub struct CacheStore {
    /// Key to recency list slot
    index: HashMap<String, usize>,
    /// Entries ordered from most to least recently used
    recency: RecencyList<CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// A capacity of zero yields a store that never retains anything.
    pub fn new(capacity: usize) -> Self {
        let reserved = capacity.min(MAX_PREALLOCATED);
        Self {
            index: HashMap::with_capacity(reserved),
            recency: RecencyList::with_capacity(reserved),
            stats: CacheStats::new(),
            capacity,
        }
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Returns None if the key is not resident; the recency order is then
    /// left untouched.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        match self.index.get(key).copied() {
            Some(slot) => {
                self.recency.move_to_front(slot);
                self.stats.record_lookup(true);
                self.recency.get(slot).map(|entry| entry.value.clone())
            }
            None => {
                self.stats.record_lookup(false);
                None
            }
        }
    }

    // == Set ==
    /// Stores a value under `key`, making it the most recently used entry.
    ///
    /// Overwriting a resident key never evicts. Inserting a new key into a
    /// full store first evicts the least recently used entry, whose key is
    /// returned.
    pub fn set(&mut self, key: String, value: Bytes) -> Option<String> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some(entry) = self.recency.get_mut(slot) {
                entry.value = value;
            }
            self.recency.move_to_front(slot);
            return None;
        }

        // Nothing is ever resident at capacity zero
        if self.capacity == 0 {
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let slot = self.recency.push_front(CacheEntry::new(key.clone(), value));
        self.index.insert(key, slot);

        evicted
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if the key was resident.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.recency.remove(slot);
                true
            }
            None => false,
        }
    }

    // == Contains ==
    /// Checks residency without touching the recency order or statistics.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Keys By Recency ==
    /// Returns resident keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.recency.iter().map(|entry| entry.key.clone()).collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.index.len())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Invariants ==
    /// Checks that index and recency list describe the same set of entries.
    ///
    /// Holds after every public operation; exposed for tests and diagnostics.
    pub fn check_invariants(&self) -> bool {
        self.index.len() == self.recency.len()
            && self.index.len() <= self.capacity
            && self.recency.is_consistent()
            && self.index.iter().all(|(key, &slot)| {
                self.recency
                    .get(slot)
                    .map(|entry| &entry.key == key)
                    .unwrap_or(false)
            })
    }

    fn evict_lru(&mut self) -> Option<String> {
        let entry = self.recency.pop_back()?;
        self.index.remove(&entry.key);
        self.stats.record_eviction();
        Some(entry.key)
    }
}
