//! Freqcache - An in-process key-value cache
//!
//! Provides TTL expiration and approximate (sampled) LFU eviction,
//! plus a background janitor task that sweeps expired entries.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_janitor;
