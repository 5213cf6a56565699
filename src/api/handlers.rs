//! API Handlers
//!
//! HTTP request handlers for each store server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    DeleteResponse, ExistsResponse, GetResponse, HealthResponse, KeysQuery, KeysResponse,
    SetRequest, SetResponse, StatsResponse,
};
use crate::remote::ttl_secs_to_ms;

/// Application state shared across all handlers.
///
/// The expiring cache synchronizes internally, so no outer lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ExpiringCache<String, String>>,
}

impl AppState {
    /// Creates a new AppState serving the given cache.
    pub fn new(cache: ExpiringCache<String, String>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState sweeping at `config.sweep_interval_ms`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ExpiringCache::from_config(config))
    }
}

/// Handler for PUT /set
///
/// Stores a value with an optional TTL in seconds; absent or zero never expires.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>, ApiError> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let ttl_ms = ttl_secs_to_ms(req.ttl.unwrap_or(0));
    state.cache.set_with_ttl(req.key.clone(), req.value, ttl_ms);
    debug!(key = %req.key, ttl_ms, "stored key");

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    match state.cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExistsResponse> {
    let exists = state.cache.get(&key).is_some();
    Json(ExistsResponse::new(key, exists))
}

/// Handler for DELETE /del/:key
///
/// Always succeeds; `deleted` reports whether the key was present.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.cache.delete(&key);
    Json(DeleteResponse::new(key, deleted))
}

/// Handler for GET /keys?prefix=...
///
/// Expired entries are purged first so only live keys are listed.
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Json<KeysResponse> {
    state.cache.purge_expired();

    let prefix = query.prefix.unwrap_or_default();
    let keys = state
        .cache
        .keys()
        .into_iter()
        .filter(|key| key.starts_with(&prefix))
        .collect();

    Json(KeysResponse { keys })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
