//! Memory Store Module
//!
//! In-process backend: a HashMap of entries plus a FIFO order tracker, both
//! behind a single reader/writer lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, FifoOrder, Options, Store};
use crate::error::Result;
use crate::tasks::{Sweep, Sweeper};

/// Backend identity reported in stats
pub const MEMORY_BACKEND: &str = "memory";

// == Memory State ==
/// Everything guarded by the store lock.
#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, CacheEntry>,
    order: FifoOrder,
}

impl MemoryState {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    /// Pops oldest insertions until the map fits in `max_entries`.
    fn evict_overflow(&mut self, max_entries: usize) -> usize {
        let mut evicted = 0;
        while self.entries.len() > max_entries {
            match self.order.pop_oldest() {
                Some(key) => {
                    self.entries.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}

#[derive(Debug)]
struct MemoryInner {
    state: RwLock<MemoryState>,
    options: Options,
}

// == Memory Store ==
/// In-memory `Store` with lazy expiry and FIFO capacity eviction.
///
/// # Example
///
/// ```rust,no_run
/// use cache_engine::cache::{MemoryStore, Options, Store};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let store = MemoryStore::new(Options::default().with_max_entries(1000));
///     store.write("key", b"value".to_vec()).await.unwrap();
///     assert!(store.exist("key").await.unwrap());
///     store.close().await;
/// }
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
    sweeper: Sweeper,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new store, spawning its sweeper when
    /// `options.cleanup_interval` is non-zero.
    ///
    /// # Panics
    ///
    /// Panics if a sweeper must be spawned outside of a Tokio runtime.
    pub fn new(options: Options) -> Self {
        let inner = Arc::new(MemoryInner {
            state: RwLock::new(MemoryState::default()),
            options,
        });
        let sweeper = Sweeper::start(
            Arc::clone(&inner),
            inner.options.cleanup_interval,
            inner.options.cleanup_batch_size,
        );

        Self { inner, sweeper }
    }

    // == Sweep Now ==
    /// Runs one sweep cycle immediately, returning the number removed.
    pub async fn sweep_expired(&self) -> u64 {
        self.inner.sweep(self.inner.options.cleanup_batch_size).await
    }

    /// Current number of physically stored entries.
    pub async fn len(&self) -> usize {
        self.inner.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl MemoryInner {
    async fn sweep(&self, limit: usize) -> u64 {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut expired: Vec<(String, chrono::DateTime<Utc>)> = state
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| (entry.key.clone(), entry.created_at))
            .collect();

        // Oldest first, so a truncated batch still drops the longest-expired
        expired.sort_by_key(|(_, created_at)| *created_at);
        if limit > 0 {
            expired.truncate(limit);
        }

        for (key, _) in &expired {
            state.remove(key);
        }

        expired.len() as u64
    }
}

#[async_trait]
impl Sweep for MemoryInner {
    async fn sweep_expired(&self, limit: usize) -> Result<u64> {
        Ok(self.sweep(limit).await)
    }

    fn backend_name(&self) -> &'static str {
        MEMORY_BACKEND
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn options(&self) -> &Options {
        &self.inner.options
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Utc::now();
        let state = self.inner.state.read().await;

        // Expired entries are left for the sweeper
        Ok(state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone()))
    }

    async fn write_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let mut guard = self.inner.state.write().await;
        let state = &mut *guard;

        match state.entries.get_mut(key) {
            Some(entry) => {
                if entry.refresh(value, now, ttl) {
                    state.order.move_to_back(key);
                }
            }
            None => {
                state.order.push(key);
                state
                    .entries
                    .insert(key.to_string(), CacheEntry::new(key, value, now, ttl));
            }
        }

        if self.inner.options.is_bounded() {
            let evicted = state.evict_overflow(self.inner.options.max_entries);
            if evicted > 0 {
                debug!("Evicted {} entries to stay within capacity", evicted);
            }
        }

        debug_assert_eq!(state.entries.len(), state.order.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.state.write().await.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let mut guard = self.inner.state.write().await;
        let state = &mut *guard;

        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        state.order.retain(|key| !key.starts_with(prefix));

        Ok((before - state.entries.len()) as u64)
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.inner.state.write().await;
        state.entries.clear();
        state.order.clear();
        Ok(())
    }

    async fn exist(&self, key: &str) -> Result<bool> {
        let now = Utc::now();
        let state = self.inner.state.read().await;

        Ok(state
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now)))
    }

    async fn stats(&self) -> Result<CacheStats> {
        let now = Utc::now();
        let state = self.inner.state.read().await;
        let expired = state
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();

        Ok(CacheStats {
            entries: state.entries.len() as u64,
            expired_entries: expired as u64,
            max_entries: self.inner.options.max_entries,
            ttl: self.inner.options.ttl,
            backend: MEMORY_BACKEND,
        })
    }

    async fn close(&self) {
        self.sweeper.stop().await;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn test_options() -> Options {
        Options::default().with_cleanup_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_store_write_and_read() {
        let store = MemoryStore::new(test_options());

        store.write("key1", b"value1".to_vec()).await.unwrap();

        assert_eq!(store.read("key1").await.unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_read_missing() {
        let store = MemoryStore::new(test_options());
        assert_eq!(store.read("nonexistent").await.unwrap(), None);
        assert!(!store.exist("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let store = MemoryStore::new(test_options());

        store.write("key1", b"value1".to_vec()).await.unwrap();
        store.write("key1", b"value2".to_vec()).await.unwrap();

        assert_eq!(store.read("key1").await.unwrap(), Some(b"value2".to_vec()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_hidden_but_kept() {
        let store = MemoryStore::new(test_options());

        store
            .write_with_ttl("short", vec![9], Duration::from_millis(30))
            .await
            .unwrap();
        assert!(store.exist("short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.read("short").await.unwrap(), None);
        assert!(!store.exist("short").await.unwrap());
        // Still physically present until a sweep
        assert_eq!(store.len().await, 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.live_entries(), 0);
    }

    #[tokio::test]
    async fn test_fifo_eviction_ignores_overwrites() {
        let store = MemoryStore::new(test_options().with_max_entries(3));

        store.write("a", vec![1]).await.unwrap();
        store.write("b", vec![2]).await.unwrap();
        store.write("c", vec![3]).await.unwrap();

        // Overwriting "a" does not make it younger
        store.write("a", vec![10]).await.unwrap();
        store.write("d", vec![4]).await.unwrap();

        assert_eq!(store.read("a").await.unwrap(), None);
        assert!(store.exist("b").await.unwrap());
        assert!(store.exist("c").await.unwrap());
        assert!(store.exist("d").await.unwrap());
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_rewriting_expired_key_counts_as_new() {
        let store = MemoryStore::new(test_options().with_max_entries(2));

        store
            .write_with_ttl("a", vec![1], Duration::from_millis(20))
            .await
            .unwrap();
        store.write("b", vec![2]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // "a" had expired, so this write puts it behind "b"
        store.write("a", vec![3]).await.unwrap();
        store.write("c", vec![4]).await.unwrap();

        assert_eq!(store.read("b").await.unwrap(), None);
        assert_eq!(store.read("a").await.unwrap(), Some(vec![3]));
        assert_eq!(store.read("c").await.unwrap(), Some(vec![4]));
    }

    #[tokio::test]
    async fn test_sweep_removes_oldest_expired_first() {
        let store = MemoryStore::new(test_options().with_cleanup_batch_size(2));

        for key in ["first", "second", "third"] {
            store
                .write_with_ttl(key, vec![0], Duration::from_millis(10))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        store.write("live", vec![1]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.sweep_expired().await, 2);
        let remaining: Vec<String> = {
            let state = store.inner.state.read().await;
            let mut keys: Vec<String> = state.entries.keys().cloned().collect();
            keys.sort();
            keys
        };
        assert_eq!(remaining, vec!["live".to_string(), "third".to_string()]);

        assert_eq!(store.sweep_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.read("live").await.unwrap(), Some(vec![1]));
    }

    #[tokio::test]
    async fn test_sweep_of_large_backlog_keeps_order_consistent() {
        let store = MemoryStore::new(test_options().with_max_entries(5_000));

        for i in 0..4_000 {
            store
                .write_with_ttl(&format!("old{}", i), vec![0], Duration::from_millis(10))
                .await
                .unwrap();
        }
        store.write("live", vec![1]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.inner.sweep(0).await, 4_000);
        let state = store.inner.state.read().await;
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.order.len(), 1);
        assert!(state.order.contains("live"));
    }

    #[tokio::test]
    async fn test_delete_by_prefix_keeps_order_consistent() {
        let store = MemoryStore::new(test_options().with_max_entries(3));

        store.write("a-1", vec![1]).await.unwrap();
        store.write("b-1", vec![2]).await.unwrap();
        store.write("a-2", vec![3]).await.unwrap();

        assert_eq!(store.delete_by_prefix("a-").await.unwrap(), 2);

        store.write("c-1", vec![4]).await.unwrap();
        store.write("c-2", vec![5]).await.unwrap();
        store.write("c-3", vec![6]).await.unwrap();

        // "b-1" is now the oldest survivor and goes first
        assert_eq!(store.read("b-1").await.unwrap(), None);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_prefix_is_case_sensitive() {
        let store = MemoryStore::new(test_options());

        store.write("User:1", vec![1]).await.unwrap();
        store.write("user:1", vec![2]).await.unwrap();

        assert_eq!(store.delete_by_prefix("user:").await.unwrap(), 1);
        assert!(store.exist("User:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_background_sweeper_reclaims_entries() {
        let store = MemoryStore::new(
            Options::default().with_cleanup_interval(Duration::from_millis(25)),
        );

        store
            .write_with_ttl("expire_soon", vec![1], Duration::from_millis(10))
            .await
            .unwrap();
        store.write("long_lived", vec![2]).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(store.len().await, 1);
        assert!(store.exist("long_lived").await.unwrap());
        store.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = MemoryStore::new(Options::default());
        store.close().await;
        store.close().await;
        assert!(!store.sweeper.is_running().await);
    }
}
