//! Cache Module
//!
//! Key/value caching behind the `Store` contract, with TTL expiration, FIFO
//! capacity eviction, prefix invalidation and background sweeping.
//!
//! # Backends
//! - `MemoryStore`: in-process map guarded by a reader/writer lock
//! - `PersistentStore`: rows in a relational table (SQLite via sqlx)

mod entry;
mod fifo;
mod memory;
mod options;
mod persistent;
mod stats;
mod store;
mod table;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tracing::info;

use crate::config::{Backend, Config};
use crate::error::Result;

// Re-export public types
pub use entry::{expiry_after, CacheEntry};
pub use fifo::FifoOrder;
pub use memory::{MemoryStore, MEMORY_BACKEND};
pub use options::{Options, DEFAULT_CLEANUP_BATCH_SIZE, DEFAULT_CLEANUP_INTERVAL, DEFAULT_TTL};
pub use persistent::PersistentStore;
pub use stats::CacheStats;
pub use store::Store;
pub use table::{EntryTable, SqliteTable, SQLITE_BACKEND, SQLITE_MEMORY_URL};

// == Open Store ==
/// Builds the backend selected by `config`.
///
/// Must be called from within a Tokio runtime when background sweeping is
/// enabled.
pub async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    let options = config.store_options();

    let store: Arc<dyn Store> = match config.backend {
        Backend::Memory => Arc::new(MemoryStore::new(options)),
        Backend::Sqlite => {
            let table = SqliteTable::connect(&config.database_url).await?;
            Arc::new(PersistentStore::open(table, options).await?)
        }
    };

    info!("Opened {} cache store", config.backend);
    Ok(store)
}
