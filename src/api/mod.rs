//! API Module
//!
//! Thin HTTP surface over a `Store`, used by the server binary.
//!
//! # Endpoints
//! - `PUT /cache` - Store a key-value pair
//! - `DELETE /cache` - Remove every entry
//! - `GET /cache/:key` - Retrieve a value by key (UTF-8 text; other bytes are replaced with U+FFFD)
//! - `DELETE /cache/:key` - Delete a key
//! - `GET /cache/:key/exists` - Check whether a key is readable
//! - `DELETE /prefix/:prefix` - Delete every key with a prefix
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
