//! Cache Entry Module
//!
//! Defines the unit of storage shared by both backends.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

// == Cache Entry ==
/// A single cache entry with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cache key
    pub key: String,
    /// The stored value, never interpreted by the cache
    pub value: Vec<u8>,
    /// Moment the entry was (re)established, used for FIFO ordering
    pub created_at: DateTime<Utc>,
    /// Moment the entry becomes invisible to readers
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl`.
    pub fn new(key: impl Into<String>, value: Vec<u8>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            created_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks if the entry has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    // == Refresh ==
    /// Replaces value and expiry after an overwrite at `now`.
    ///
    /// A live entry keeps its `created_at` (and so its FIFO position); an
    /// entry that had already expired is re-established as new. Returns true
    /// in the latter case.
    pub fn refresh(&mut self, value: Vec<u8>, now: DateTime<Utc>, ttl: Duration) -> bool {
        let reborn = self.is_expired_at(now);
        if reborn {
            self.created_at = now;
        }
        self.value = value;
        self.expires_at = expiry_after(now, ttl);
        reborn
    }
}

// == Utility Functions ==
/// Returns `now + ttl`, saturating at the largest representable instant.
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
