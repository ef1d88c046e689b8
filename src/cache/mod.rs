//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and sampled LFU eviction.

mod entry;
mod sampler;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Ttl};
pub use sampler::EvictionSampler;
pub use stats::CacheStats;
pub use store::Cache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Number of slots in the eviction candidate pool
pub const EVICTION_POOL_SIZE: usize = 16;

/// Frequency lost per idle second during decay
pub const FREQ_DECAY_RATE: f64 = 0.05;

// == Key Convention ==
/// Builds a composite lookup key of the form
/// `"{entity_type}:{index_name}:{v1}:{v2}..."`.
///
/// This is the convention callers use for index-style lookups
/// (e.g. `"chat_user:platform_info:qq:12345"`). It is a caller-side
/// convenience only; the cache itself treats keys as opaque strings.
pub fn composite_key(entity_type: &str, index_name: &str, index_values: &[&str]) -> String {
    let mut key = format!("{}:{}", entity_type, index_name);
    for value in index_values {
        key.push(':');
        key.push_str(value);
    }
    key
}
