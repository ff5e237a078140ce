//! Cache Statistics Module
//!
//! Point-in-time snapshot of a store's contents and limits.

use std::time::Duration;

use serde::Serialize;

// == Cache Stats ==
/// Snapshot computed on demand from a backend's own storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries physically stored, including expired ones not yet swept
    pub entries: u64,
    /// Entries past their expiry that the sweeper has not removed yet
    pub expired_entries: u64,
    /// Configured capacity, 0 = unbounded
    pub max_entries: usize,
    /// Configured default TTL
    pub ttl: Duration,
    /// Backend identity
    pub backend: &'static str,
}

impl CacheStats {
    /// Number of entries a reader could still see.
    pub fn live_entries(&self) -> u64 {
        self.entries.saturating_sub(self.expired_entries)
    }
}
