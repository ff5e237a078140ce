//! Entry Table Module
//!
//! The relational-table collaborator behind the persistent backend, and its
//! SQLite implementation on top of sqlx.
//!
//! Schema:
//!
//! ```sql
//! cache_entries(key TEXT PRIMARY KEY, value BLOB, expires_at INTEGER, created_at INTEGER, seq INTEGER)
//! ```
//!
//! Timestamps are Unix milliseconds; both timestamp columns are indexed.
//! `seq` is the insertion sequence: it only grows, and is reassigned when a
//! row is re-established after expiring. FIFO eviction orders by it.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::cache::CacheEntry;
use crate::error::Result;

/// Backend identity reported in stats
pub const SQLITE_BACKEND: &str = "sqlite";

/// URL selecting a private in-memory database
pub const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

// == Entry Table ==
/// Storage capabilities the persistent store needs from its table.
///
/// Each method is a single statement, atomic on its own. Implementations
/// return driver failures as `CacheError::Storage`.
#[async_trait]
pub trait EntryTable: Send + Sync + 'static {
    /// Creates the table and its indexes if they do not exist yet
    async fn ensure_schema(&self) -> Result<()>;

    /// Inserts or replaces the row for `entry.key`.
    ///
    /// When the existing row is still live at `entry.created_at`, its
    /// `created_at` and insertion sequence are kept so the key holds its
    /// FIFO position. Otherwise the row moves behind every other row.
    async fn upsert(&self, entry: &CacheEntry) -> Result<()>;

    /// Value of `key` if its row exists and has not expired at `now`
    async fn fetch_live(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>>;

    /// Whether `key` has a row that has not expired at `now`
    async fn contains_live(&self, key: &str, now: DateTime<Utc>) -> Result<bool>;

    async fn delete_key(&self, key: &str) -> Result<u64>;

    /// Deletes rows whose key starts with `prefix`, case-sensitively
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;

    async fn delete_all(&self) -> Result<u64>;

    /// Deletes up to `limit` rows expired at `now` (0 = no limit), oldest first
    async fn delete_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<u64>;

    /// Deletes every row except the `keep` newest insertions
    async fn delete_oldest_beyond(&self, keep: usize) -> Result<u64>;

    async fn count_all(&self) -> Result<u64>;

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Backend identity
    fn backend_name(&self) -> &'static str;
}

// == SQLite Table ==
/// `EntryTable` stored in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteTable {
    pool: SqlitePool,
}

impl SqliteTable {
    /// Wraps an existing pool. The schema is created by `PersistentStore::open`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `url`, creating the database file when missing.
    pub async fn connect(url: &str) -> Result<Self> {
        if url == SQLITE_MEMORY_URL {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` is its own database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect(SQLITE_MEMORY_URL)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EntryTable for SqliteTable {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                seq INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cache_entries_created_at ON cache_entries(created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cache_entries_seq ON cache_entries(seq)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        // SET expressions all see the pre-update row
        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at, created_at, seq)
             VALUES (?1, ?2, ?3, ?4, (SELECT IFNULL(MAX(seq), 0) + 1 FROM cache_entries))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                created_at = CASE
                    WHEN cache_entries.expires_at <= excluded.created_at THEN excluded.created_at
                    ELSE cache_entries.created_at
                END,
                seq = CASE
                    WHEN cache_entries.expires_at <= excluded.created_at THEN excluded.seq
                    ELSE cache_entries.seq
                END",
        )
        .bind(entry.key.as_str())
        .bind(entry.value.as_slice())
        .bind(entry.expires_at.timestamp_millis())
        .bind(entry.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_live(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>> {
        let value = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
        )
        .bind(key)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn contains_live(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM cache_entries WHERE key = ?1 AND expires_at > ?2)",
        )
        .bind(key)
        .bind(now.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    async fn delete_key(&self, key: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        // LIKE would be case-insensitive and treat % and _ as wildcards
        let result =
            sqlx::query("DELETE FROM cache_entries WHERE substr(key, 1, length(?1)) = ?1")
                .bind(prefix)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>, limit: usize) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM cache_entries WHERE key IN (
                SELECT key FROM cache_entries
                WHERE expires_at <= ?1
                ORDER BY created_at, seq
                LIMIT ?2
            )",
        )
        .bind(now.timestamp_millis())
        .bind(sql_limit(limit))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_oldest_beyond(&self, keep: usize) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM cache_entries WHERE key IN (
                SELECT key FROM cache_entries
                ORDER BY seq DESC
                LIMIT -1 OFFSET ?1
            )",
        )
        .bind(i64::try_from(keep).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_all(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cache_entries WHERE expires_at <= ?1")
                .bind(now.timestamp_millis())
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    fn backend_name(&self) -> &'static str {
        SQLITE_BACKEND
    }
}

/// SQLite reads a negative LIMIT as "no limit".
fn sql_limit(limit: usize) -> i64 {
    if limit == 0 {
        -1
    } else {
        i64::try_from(limit).unwrap_or(-1)
    }
}
