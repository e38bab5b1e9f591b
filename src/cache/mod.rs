//! Cache Module
//!
//! Provides a bounded in-memory store for JSON documents with LRU eviction.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::RecencyList;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;
