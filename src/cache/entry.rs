//! Cache Entry Module
//!
//! Defines the key/value pair held by each recency list node.

use bytes::Bytes;

// == Cache Entry ==
/// A resident cache entry.
///
/// The value is the raw JSON payload exactly as the client sent it. The
/// engine never parses it; cloning is a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The key this entry is indexed under
    pub key: String,
    /// The stored JSON document
    pub value: Bytes,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
