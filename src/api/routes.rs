//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, delete_prefix_handler, exists_handler, get_handler,
    health_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Store a key-value pair
/// - `DELETE /cache` - Remove every entry
/// - `GET /cache/:key` - Retrieve a value by key (UTF-8 text; other bytes are replaced with U+FFFD)
/// - `DELETE /cache/:key` - Delete a key
/// - `GET /cache/:key/exists` - Check whether a key is readable
/// - `DELETE /prefix/:prefix` - Delete every key with a prefix
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(set_handler).delete(clear_handler))
        .route("/cache/:key", get(get_handler).delete(delete_handler))
        .route("/cache/:key/exists", get(exists_handler))
        .route("/prefix/:prefix", delete(delete_prefix_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
