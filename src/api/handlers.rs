//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, KeyQuery, SetRequest, StatsResponse, StatusResponse};

/// Application state shared across all handlers.
///
/// Holds the one cache instance of the process; cloning the state clones
/// the handle, not the cache.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(SharedCache::with_shards(
            config.cache_size,
            config.cache_shards,
        ))
    }
}

/// Handler for POST /set
///
/// The body is parsed by hand so that every malformed request, including
/// a bad `value`, is answered with 400.
pub async fn set_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<StatusResponse>> {
    let req = SetRequest::from_slice(&body)?;
    let value = Bytes::copy_from_slice(req.value_json().as_bytes());

    if let Some(evicted) = state.cache.set(req.key.as_str(), value) {
        debug!(key = %evicted, "evicted least recently used entry");
    }
    info!(key = %req.key, "data stored successfully");

    Ok(Json(StatusResponse::ok()))
}

/// Handler for GET /get?key=K
///
/// Responds with the stored document verbatim.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response> {
    let key = query.into_key()?;
    match state.cache.get(&key) {
        Some(value) => Ok(([(header::CONTENT_TYPE, "application/json")], value).into_response()),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del?key=K
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<StatusResponse>> {
    let key = query.into_key()?;
    if state.cache.delete(&key) {
        info!(key = %key, "key deleted");
        Ok(Json(StatusResponse::deleted()))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(&stats, state.cache.capacity()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
