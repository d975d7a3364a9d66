//! API Handlers
//!
//! HTTP request handlers for each sidecar endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::RequestCache;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
};

/// Cache type served by the sidecar: arbitrary JSON results.
pub type SidecarCache = RequestCache<Value, anyhow::Error>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache handle
    pub cache: SidecarCache,
}

impl AppState {
    pub fn new(cache: SidecarCache) -> Self {
        Self { cache }
    }

    /// Builds the cache from configuration, failing on invalid parameters.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(RequestCache::new(config.clone())?))
    }
}

/// Handler for PUT /entries
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    req.validate()?;

    let ttl = req.ttl_ms.map(Duration::from_millis);
    state.cache.set_with_ttl(req.key.clone(), req.value, ttl)?;
    info!(key = %req.key, "entry pre-warmed");

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let ttl_remaining_ms = state.cache.ttl_remaining_ms(&key);

    Ok(Json(GetResponse {
        key,
        value,
        ttl_remaining_ms,
    }))
}

/// Handler for DELETE /entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.invalidate(&key) {
        return Err(CacheError::NotFound(key));
    }
    info!(key = %key, "entry invalidated");

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let config = state.cache.config();
    let default_ttl_ms = u64::try_from(config.default_ttl.as_millis()).unwrap_or(u64::MAX);

    Json(StatsResponse::new(
        state.cache.stats(),
        config.max_entries,
        default_ttl_ms,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
