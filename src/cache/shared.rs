//! Shared Cache Module
//!
//! Thread-safe handle over one or more independently locked [`CacheStore`]
//! partitions.
//!
//! Every operation, `get` included, takes the partition's exclusive lock:
//! a hit relinks the recency list, so there is no read-only path. Locks are
//! held for O(1) work and never across an `.await`, which is why a blocking
//! `parking_lot::Mutex` is used rather than an async lock.

use std::sync::Arc;

use ahash::RandomState;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore};

// == Shared Cache ==
/// Cloneable handle to a single cache instance.
///
/// Clones share the same partitions. With one partition the cache is an
/// exact global LRU; with N partitions each key is pinned to
/// `hash(key) % N` and eviction is LRU within that partition only, so the
/// global capacity is enforced with a granularity of 1/N.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<Partitions>,
}

#[derive(Debug)]
struct Partitions {
    /// Independently locked stores
    shards: Box<[Mutex<CacheStore>]>,
    /// Fixed for the lifetime of the cache so a key never changes partition
    hasher: RandomState,
    /// Total capacity across all shards
    capacity: usize,
}

impl SharedCache {
    // == Constructor ==
    /// Creates a single-partition cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self::with_shards(capacity, 1)
    }

    /// Creates a cache split into `shards` partitions.
    ///
    /// The shard count is clamped to `1..=capacity` so that no partition has
    /// zero capacity. Capacity is divided evenly; the remainder goes to the
    /// first partitions.
    pub fn with_shards(capacity: usize, shards: usize) -> Self {
        let count = if capacity == 0 {
            1
        } else {
            shards.clamp(1, capacity)
        };
        let base = capacity / count;
        let extra = capacity % count;

        let shards = (0..count)
            .map(|i| Mutex::new(CacheStore::new(base + usize::from(i < extra))))
            .collect();

        Self {
            inner: Arc::new(Partitions {
                shards,
                hasher: RandomState::new(),
                capacity,
            }),
        }
    }

    // == Get ==
    /// Retrieves a value and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.shard_for(key).lock().get(key)
    }

    // == Set ==
    /// Stores a value, returning the key evicted to make room, if any.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>) -> Option<String> {
        let key = key.into();
        self.shard_for(&key).lock().set(key, value.into())
    }

    // == Delete ==
    /// Removes a key, returning true if it was resident.
    pub fn delete(&self, key: &str) -> bool {
        self.shard_for(key).lock().delete(key)
    }

    // == Stats ==
    /// Returns statistics summed over all partitions.
    pub fn stats(&self) -> CacheStats {
        self.inner
            .shards
            .iter()
            .map(|shard| shard.lock().stats())
            .sum()
    }

    /// Number of resident entries across all partitions.
    pub fn len(&self) -> usize {
        self.inner.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    /// Runs [`CacheStore::check_invariants`] on every partition.
    pub fn check_invariants(&self) -> bool {
        self.inner
            .shards
            .iter()
            .all(|shard| shard.lock().check_invariants())
    }

    fn shard_for(&self, key: &str) -> &Mutex<CacheStore> {
        let shards = &self.inner.shards;
        if shards.len() == 1 {
            return &shards[0];
        }
        let hash = self.inner.hasher.hash_one(key);
        &shards[(hash % shards.len() as u64) as usize]
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_basic_operations() {
        let cache = SharedCache::new(10);

        assert!(cache.set("key", Bytes::from_static(b"[1,2]")).is_none());
        assert_eq!(cache.get("key"), Some(Bytes::from_static(b"[1,2]")));
        assert!(cache.delete("key"));
        assert!(!cache.delete("key"));
        assert!(cache.get("key").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let cache = SharedCache::new(10);
        let other = cache.clone();

        cache.set("shared", Bytes::from_static(b"1"));

        assert_eq!(other.get("shared"), Some(Bytes::from_static(b"1")));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_recency_update_on_read() {
        let cache = SharedCache::new(2);

        cache.set("A", Bytes::from_static(b"1"));
        cache.set("B", Bytes::from_static(b"2"));
        cache.get("A");

        assert_eq!(cache.set("C", Bytes::from_static(b"3")), Some("B".to_string()));
        assert!(cache.get("A").is_some());
    }

    #[test]
    fn test_shard_count_is_clamped() {
        assert_eq!(SharedCache::with_shards(10, 0).shard_count(), 1);
        assert_eq!(SharedCache::with_shards(3, 8).shard_count(), 3);
        assert_eq!(SharedCache::with_shards(0, 8).shard_count(), 1);
        assert_eq!(SharedCache::with_shards(64, 8).shard_count(), 8);
    }

    #[test]
    fn test_sharded_capacity_is_split() {
        let cache = SharedCache::with_shards(10, 4);
        let per_shard: Vec<usize> = cache
            .inner
            .shards
            .iter()
            .map(|shard| shard.lock().capacity())
            .collect();

        assert_eq!(per_shard, vec![3, 3, 2, 2]);
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_sharded_capacity_invariant() {
        let cache = SharedCache::with_shards(16, 4);

        for i in 0..200 {
            cache.set(format!("key{}", i), Bytes::from(i.to_string()));
            assert!(cache.len() <= 16);
        }
        assert!(cache.check_invariants());
    }

    #[test]
    fn test_sharded_key_stays_in_its_partition() {
        let cache = SharedCache::with_shards(64, 8);

        cache.set("pinned", Bytes::from_static(b"1"));
        cache.set("pinned", Bytes::from_static(b"2"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("pinned"), Some(Bytes::from_static(b"2")));
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = SharedCache::new(0);

        cache.set("key", Bytes::from_static(b"1"));

        assert!(cache.is_empty());
        assert!(cache.get("key").is_none());
    }

    #[test]
    fn test_stats_aggregate_over_shards() {
        let cache = SharedCache::with_shards(8, 4);

        for i in 0..4 {
            cache.set(format!("key{}", i), Bytes::from_static(b"0"));
        }
        for i in 0..4 {
            cache.get(&format!("key{}", i));
        }
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 4);
    }

    #[test]
    fn test_stats_aggregate_evictions_over_shards() {
        // Four partitions of capacity one each
        let cache = SharedCache::with_shards(4, 4);

        for i in 0..20 {
            cache.set(format!("key{}", i), Bytes::from(i.to_string()));
        }

        let stats = cache.stats();
        assert_eq!(stats.total_entries, cache.len());
        assert!(stats.total_entries >= 1 && stats.total_entries <= 4);
        assert_eq!(stats.evictions as usize, 20 - stats.total_entries);
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[test]
    fn test_stats_equal_sum_of_partitions() {
        let cache = SharedCache::with_shards(12, 3);

        for i in 0..30 {
            cache.set(format!("key{}", i % 15), Bytes::from_static(b"1"));
            cache.get(&format!("key{}", (i * 5) % 17));
        }

        let mut expected = CacheStats::new();
        for shard in cache.inner.shards.iter() {
            expected.merge(&shard.lock().stats());
        }

        assert_eq!(cache.stats(), expected);
        assert_eq!(expected.hits + expected.misses, 30);
    }

    #[test]
    fn test_concurrent_mixed_traffic_keeps_invariants() {
        for shards in [1, 4] {
            let cache = SharedCache::with_shards(32, shards);

            let handles: Vec<_> = (0..8)
                .map(|worker| {
                    let cache = cache.clone();
                    thread::spawn(move || {
                        for i in 0..2_000 {
                            let key = format!("key{}", (i * 7 + worker) % 64);
                            match i % 3 {
                                0 => {
                                    cache.set(key, Bytes::from(format!("{}", i)));
                                }
                                1 => {
                                    cache.get(&key);
                                }
                                _ => {
                                    cache.delete(&key);
                                }
                            }
                            // Checked while the other workers are still running
                            if worker == 0 && i % 10 == 0 {
                                assert!(cache.check_invariants(), "broken at op {}", i);
                                assert!(cache.len() <= 32);
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert!(cache.check_invariants());
            assert!(cache.len() <= 32);
        }
    }

    #[test]
    fn test_concurrent_hits_on_same_keys() {
        let cache = SharedCache::new(4);
        for key in ["a", "b", "c", "d"] {
            cache.set(key, Bytes::from_static(b"{}"));
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..5_000 {
                        for key in ["a", "b", "c", "d"] {
                            assert!(cache.get(key).is_some());
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 4);
        assert!(cache.check_invariants());
    }
}
