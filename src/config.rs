//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_capacity: usize,
    /// Janitor sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CLEANUP_INTERVAL` - Janitor sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            max_capacity: env::var("MAX_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            cleanup_interval: 60,
        }
    }
}
