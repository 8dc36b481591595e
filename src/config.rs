//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Total cache capacity in bytes, split evenly across shards
    pub capacity_bytes: usize,
    /// Background vacuum task interval in seconds
    pub vacuum_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY_BYTES` - Total capacity in bytes (default: 64 MiB)
    /// - `VACUUM_INTERVAL_SECS` - Vacuum frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            capacity_bytes: env::var("CACHE_CAPACITY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64 * 1024 * 1024),
            vacuum_interval: env::var("VACUUM_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: 64 * 1024 * 1024,
            vacuum_interval: 60,
        }
    }
}
