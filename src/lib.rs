//! Cache Engine - A backend-agnostic key/value cache
//!
//! Provides TTL expiration, bounded capacity with FIFO eviction, prefix
//! invalidation and background sweeping over interchangeable memory and
//! SQLite backends.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{open_store, MemoryStore, Options, PersistentStore, Store};
pub use config::Config;
