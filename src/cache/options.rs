//! Store Options Module
//!
//! Construction-time configuration shared by every backend.

use std::time::Duration;

// == Defaults ==
/// Default TTL applied by plain writes: 14 days
pub const DEFAULT_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Default interval between background sweeps: 1 hour
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default upper bound on entries removed per sweep
pub const DEFAULT_CLEANUP_BATCH_SIZE: usize = 100;

// == Options ==
/// Immutable store configuration, resolved once when a store is built.
///
/// # Example
///
/// ```rust
/// use cache_engine::cache::Options;
/// use std::time::Duration;
///
/// let options = Options::default()
///     .with_ttl(Duration::from_secs(3600))
///     .with_max_entries(10_000);
/// assert_eq!(options.max_entries, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// TTL used by `Store::write`
    pub ttl: Duration,
    /// Maximum number of entries, 0 = unbounded
    pub max_entries: usize,
    /// Interval between background sweeps, zero disables the sweeper
    pub cleanup_interval: Duration,
    /// Maximum entries removed per sweep cycle, 0 = no limit
    pub cleanup_batch_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: 0,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            cleanup_batch_size: DEFAULT_CLEANUP_BATCH_SIZE,
        }
    }
}

impl Options {
    /// Creates options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the entry limit (0 = unbounded)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the sweep interval (zero disables background sweeping)
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets the per-cycle sweep limit (0 = no limit)
    pub fn with_cleanup_batch_size(mut self, batch_size: usize) -> Self {
        self.cleanup_batch_size = batch_size;
        self
    }

    /// Returns true when writes must enforce a capacity bound
    pub fn is_bounded(&self) -> bool {
        self.max_entries > 0
    }

    /// Returns true when a background sweeper should run
    pub fn sweeps_in_background(&self) -> bool {
        !self.cleanup_interval.is_zero()
    }
}
