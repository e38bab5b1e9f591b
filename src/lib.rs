//! gcache - An in-memory LRU cache server for JSON documents
//!
//! Stores arbitrary JSON values by string key in a fixed-capacity cache
//! that evicts the least recently used entry when full.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::SharedCache;
pub use config::Config;
