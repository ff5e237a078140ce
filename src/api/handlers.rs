//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::Store;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, ExistsResponse, GetResponse, HealthResponse,
    PrefixDeleteResponse, SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The store serializes its own mutations, so handlers share it directly.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Creates a new AppState around an opened store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Handler for PUT /cache
///
/// Stores a key-value pair with an optional TTL in seconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let value = req.value.into_bytes();
    match req.ttl {
        Some(ttl) => {
            state
                .store
                .write_with_ttl(&req.key, value, Duration::from_secs(ttl))
                .await?
        }
        None => state.store.write(&req.key, value).await?,
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
///
/// The value is returned as text; bytes that are not UTF-8 are replaced.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.store.read(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, &value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /cache/:key/exists
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ExistsResponse>> {
    let exists = state.store.exist(&key).await?;
    Ok(Json(ExistsResponse { key, exists }))
}

/// Handler for DELETE /cache/:key
///
/// Deleting a missing key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.store.delete(&key).await?;
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /prefix/:prefix
pub async fn delete_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<Json<PrefixDeleteResponse>> {
    let deleted = state.store.delete_by_prefix(&prefix).await?;
    Ok(Json(PrefixDeleteResponse { prefix, deleted }))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.store.clear().await?;
    Ok(Json(ClearResponse::cleared()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.store.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
