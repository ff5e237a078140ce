//! Persistent Store Module
//!
//! Table-backed backend. Every operation maps onto one `EntryTable`
//! statement, so single-row atomicity comes from the database.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, EntryTable, Options, SqliteTable, Store};
use crate::error::Result;
use crate::tasks::{Sweep, Sweeper};

struct PersistentInner<T> {
    table: T,
    options: Options,
}

#[async_trait]
impl<T: EntryTable> Sweep for PersistentInner<T> {
    async fn sweep_expired(&self, limit: usize) -> Result<u64> {
        self.table.delete_expired(Utc::now(), limit).await
    }

    fn backend_name(&self) -> &'static str {
        self.table.backend_name()
    }
}

// == Persistent Store ==
/// `Store` whose entries live in a relational table.
///
/// Capacity is enforced after each write with a single conditional delete
/// that keeps only the newest `max_entries` rows, so concurrent writers
/// cannot push the table past the bound once their writes have returned.
pub struct PersistentStore<T: EntryTable = SqliteTable> {
    inner: Arc<PersistentInner<T>>,
    sweeper: Sweeper,
}

impl<T: EntryTable> PersistentStore<T> {
    // == Constructor ==
    /// Ensures the table schema exists, then starts the sweeper when
    /// `options.cleanup_interval` is non-zero.
    pub async fn open(table: T, options: Options) -> Result<Self> {
        table.ensure_schema().await?;

        let inner = Arc::new(PersistentInner { table, options });
        let sweeper = Sweeper::start(
            Arc::clone(&inner),
            inner.options.cleanup_interval,
            inner.options.cleanup_batch_size,
        );

        Ok(Self { inner, sweeper })
    }

    pub fn table(&self) -> &T {
        &self.inner.table
    }

    // == Sweep Now ==
    /// Runs one sweep cycle immediately, returning the number removed.
    pub async fn sweep_expired(&self) -> Result<u64> {
        self.inner
            .sweep_expired(self.inner.options.cleanup_batch_size)
            .await
    }

    async fn enforce_limit(&self) -> Result<()> {
        if !self.inner.options.is_bounded() {
            return Ok(());
        }

        let evicted = self
            .inner
            .table
            .delete_oldest_beyond(self.inner.options.max_entries)
            .await?;
        if evicted > 0 {
            debug!("Evicted {} rows to stay within capacity", evicted);
        }
        Ok(())
    }
}

impl<T: EntryTable> std::fmt::Debug for PersistentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("backend", &self.inner.table.backend_name())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: EntryTable> Store for PersistentStore<T> {
    fn options(&self) -> &Options {
        &self.inner.options
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.table.fetch_live(key, Utc::now()).await
    }

    async fn write_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key, value, Utc::now(), ttl);
        self.inner.table.upsert(&entry).await?;
        self.enforce_limit().await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.table.delete_key(key).await?;
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        self.inner.table.delete_prefix(prefix).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.table.delete_all().await?;
        Ok(())
    }

    async fn exist(&self, key: &str) -> Result<bool> {
        self.inner.table.contains_live(key, Utc::now()).await
    }

    async fn stats(&self) -> Result<CacheStats> {
        let now = Utc::now();
        let entries = self.inner.table.count_all().await?;
        let expired_entries = self.inner.table.count_expired(now).await?;

        Ok(CacheStats {
            entries,
            expired_entries,
            max_entries: self.inner.options.max_entries,
            ttl: self.inner.options.ttl,
            backend: self.inner.table.backend_name(),
        })
    }

    async fn close(&self) {
        self.sweeper.stop().await;
    }
}
