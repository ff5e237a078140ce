//! Store Contract Module
//!
//! The operation set every backend implements with identical semantics.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheStats, Options};
use crate::error::Result;

// == Store ==
/// Backend-agnostic key/value cache.
///
/// Every mutating call completes before it returns; expiry is checked at
/// read time, and a background sweep (when enabled) only reclaims entries
/// that readers already treat as absent.
///
/// Misses, expiry and capacity eviction are never errors. An `Err` always
/// means the underlying storage failed, and is returned as-is.
#[async_trait]
pub trait Store: Send + Sync {
    /// Options the store was built with
    fn options(&self) -> &Options;

    /// Returns the value for `key`, or None if it was never written, was
    /// removed, or has expired.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Upserts `key` with the store's default TTL.
    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let ttl = self.options().ttl;
        self.write_with_ttl(key, value, ttl).await
    }

    /// Upserts `key`, expiring `ttl` from now, then enforces capacity by
    /// evicting the oldest insertions.
    async fn write_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry whose key starts with `prefix` (case-sensitive)
    /// and returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;

    /// True exactly when `read(key)` would return a value.
    async fn exist(&self, key: &str) -> Result<bool>;

    /// Point-in-time snapshot of the store
    async fn stats(&self) -> Result<CacheStats>;

    /// Stops the background sweeper and waits for it. Idempotent.
    async fn close(&self);
}
