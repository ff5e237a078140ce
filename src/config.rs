//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{Options, DEFAULT_CLEANUP_BATCH_SIZE, DEFAULT_CLEANUP_INTERVAL, DEFAULT_TTL};

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-process map
    #[default]
    Memory,
    /// SQLite table
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => f.write_str("memory"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which store implementation to build
    pub backend: Backend,
    /// Database location for the sqlite backend
    pub database_url: String,
    /// Default TTL in seconds for plain writes
    pub default_ttl: u64,
    /// Maximum number of entries, 0 = unbounded
    pub max_entries: usize,
    /// Background sweep interval in seconds, 0 = disabled
    pub cleanup_interval: u64,
    /// Maximum entries removed per sweep, 0 = no limit
    pub cleanup_batch_size: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `sqlite` (default: memory)
    /// - `DATABASE_URL` - sqlite database URL (default: sqlite://cache.db)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 1209600, 14 days)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 0, unbounded)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 3600)
    /// - `CLEANUP_BATCH_SIZE` - Entries removed per sweep (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.backend),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            cleanup_batch_size: parse_var("CLEANUP_BATCH_SIZE")
                .unwrap_or(defaults.cleanup_batch_size),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> Options {
        Options::new()
            .with_ttl(Duration::from_secs(self.default_ttl))
            .with_max_entries(self.max_entries)
            .with_cleanup_interval(Duration::from_secs(self.cleanup_interval))
            .with_cleanup_batch_size(self.cleanup_batch_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            database_url: "sqlite://cache.db".to_string(),
            default_ttl: DEFAULT_TTL.as_secs(),
            max_entries: 0,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL.as_secs(),
            cleanup_batch_size: DEFAULT_CLEANUP_BATCH_SIZE,
            server_port: 3000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
