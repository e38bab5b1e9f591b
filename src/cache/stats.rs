//! Cache Statistics Module
//!
//! Lookup and eviction counters kept by each partition under its own lock,
//! and summed into one report for `/stats`.

use std::iter::Sum;

use serde::Serialize;

// == Cache Stats ==
/// Counters for one partition, or the sum over all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a resident key
    pub hits: u64,
    /// Lookups for a key that was not resident
    pub misses: u64,
    /// Entries dropped from the tail to make room
    pub evictions: u64,
    /// Resident entries when the snapshot was taken
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one `get`, successful or not.
    pub fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Copy of the counters tagged with the current resident count.
    pub fn snapshot(&self, resident: usize) -> Self {
        Self {
            total_entries: resident,
            ..self.clone()
        }
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit; 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    /// Adds another partition's counters into this one.
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.evictions += other.evictions;
        self.total_entries += other.total_entries;
    }
}

impl Sum for CacheStats {
    fn sum<I: Iterator<Item = CacheStats>>(iter: I) -> Self {
        iter.fold(CacheStats::new(), |mut total, partition| {
            total.merge(&partition);
            total
        })
    }
}
