//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with TTL expiration and
//! sampled LFU eviction.
//!
//! Capacity is enforced lazily, at the point of insertion: a `set` that
//! would exceed `max_capacity` first sweeps expired entries and, if the
//! cache is still full, reclaims one slot through the eviction sampler.
//! Eviction work is therefore bounded by the sampler's pool size rather
//! than by the total number of entries.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, EvictionSampler, Ttl, EVICTION_POOL_SIZE, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

/// Lower bound on the derived sample rate, so very large caches still
/// refresh the pool meaningfully.
const MIN_SAMPLE_RATE: f64 = 0.05;

// == Cache ==
/// Main cache storage with sampled LFU eviction and TTL support.
///
/// All methods take `&mut self` and run to completion without suspension;
/// there is no internal locking. Shared use (for example with the janitor
/// task) goes through `Arc<tokio::sync::RwLock<Cache<V>>>`, one whole
/// operation per lock acquisition.
#[derive(Debug)]
pub struct Cache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Eviction candidate pool
    sampler: EvictionSampler,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_capacity: usize,
    /// Probability that a live entry is considered during a sampling pass
    sample_rate: f64,
}

impl<V: Clone> Cache<V> {
    // == Constructor ==
    /// Creates a new Cache with the specified capacity.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidCapacity` if `max_capacity` is zero.
    pub fn new(max_capacity: usize) -> Result<Self> {
        if max_capacity == 0 {
            return Err(CacheError::InvalidCapacity(max_capacity));
        }
        Ok(Self {
            entries: HashMap::new(),
            sampler: EvictionSampler::new(),
            stats: CacheStats::new(),
            max_capacity,
            sample_rate: Self::sample_rate_for(max_capacity),
        })
    }

    /// Derives the sampling probability from the capacity.
    ///
    /// Inversely related to capacity: smaller caches sample a larger
    /// fraction of entries per refresh, so the pool stays representative
    /// relative to a smaller population. Caches up to four times the pool
    /// size sample everything.
    fn sample_rate_for(capacity: usize) -> f64 {
        ((EVICTION_POOL_SIZE * 4) as f64 / capacity as f64).clamp(MIN_SAMPLE_RATE, 1.0)
    }

    // == Set ==
    /// Stores a key-value pair with the given TTL.
    ///
    /// If the key already exists, the value is overwritten in place and
    /// the TTL is reset (usage frequency is preserved). Otherwise, if the
    /// cache is at capacity, expired entries are swept first and a victim
    /// is evicted via the sampler if the cache is still full.
    ///
    /// # Arguments
    /// * `key` - The key to store (non-empty, at most `MAX_KEY_LENGTH` bytes)
    /// * `value` - The value to store
    /// * `ttl` - Lifetime of the entry (`Ttl::Infinite` to never expire)
    ///
    /// # Errors
    /// Returns `CacheError::InvalidKey` if the key fails validation.
    pub fn set(&mut self, key: &str, value: V, ttl: Ttl) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("key must not be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidKey(format!(
                "key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let now = current_timestamp_ms();

        // Overwrite case: update in place, frequency untouched
        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value;
            entry.reset_ttl(Some(ttl), now);
            return Ok(());
        }

        // At capacity: sweep expired entries first, then evict until a slot
        // is free. A shrinking resize can leave the cache more than one
        // entry over its capacity, so this has to loop.
        if self.entries.len() >= self.max_capacity {
            self.sweep_expired();
            while self.entries.len() >= self.max_capacity {
                self.evict_one(now);
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl, now));
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired; expired entries are
    /// removed on access (lazy expiry) and counted as misses. A successful
    /// read bumps the entry's usage frequency.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = current_timestamp_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_expired(key);
            self.stats.record_miss();
            return None;
        }

        let value = {
            let entry = self.entries.get_mut(key)?;
            entry.read(now).clone()
        };
        self.stats.record_hit();
        Some(value)
    }

    // == Contains ==
    /// Checks whether a key is present and not expired.
    ///
    /// Same lazy-expiry semantics as `get`, but a pure existence check:
    /// the entry's usage frequency is not bumped, so peeking never affects
    /// eviction priority.
    pub fn contains(&mut self, key: &str) -> bool {
        let now = current_timestamp_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };

        if expired {
            self.remove_expired(key);
            return false;
        }
        true
    }

    // == Delete ==
    /// Removes an entry by key, pruning the eviction pool view.
    ///
    /// Idempotent: deleting an absent key is a no-op. Returns true if an
    /// entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.sampler.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// This is the only O(n) operation; it is meant to be invoked
    /// periodically (via the janitor) rather than eagerly. Also runs as
    /// the first reclamation step of a `set` at capacity.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();

        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.sampler.remove(&key);
        }

        self.stats.record_expired_removals(count as u64);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Resize ==
    /// Updates the maximum capacity and re-derives the sample rate.
    ///
    /// Shrinking does not evict eagerly; the capacity bound is
    /// re-established at the next insertion.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidCapacity` if `new_max_capacity` is zero.
    pub fn resize(&mut self, new_max_capacity: usize) -> Result<()> {
        if new_max_capacity == 0 {
            return Err(CacheError::InvalidCapacity(new_max_capacity));
        }
        self.max_capacity = new_max_capacity;
        self.sample_rate = Self::sample_rate_for(new_max_capacity);
        Ok(())
    }

    // == Clear ==
    /// Drops all entries and the eviction pool.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sampler.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries allowed.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Returns the current sampling probability.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    // == Eviction ==
    /// Reclaims one slot via approximate LFU.
    ///
    /// One sampler refresh followed by a victim pick; no global minimum is
    /// computed, so the work is bounded by the pool size regardless of how
    /// many entries are live. If the pool comes up empty, an arbitrary
    /// live entry is evicted instead.
    fn evict_one(&mut self, now_ms: u64) {
        self.sampler
            .refresh(&mut self.entries, self.sample_rate, now_ms);

        let victim = self
            .sampler
            .pick_victim(&self.entries)
            .or_else(|| self.entries.keys().next().cloned());

        if let Some(key) = victim {
            debug!(key = %key, "evicting entry under capacity pressure");
            self.entries.remove(&key);
            self.sampler.remove(&key);
            self.stats.record_eviction();
        }
    }

    /// Removes an entry discovered to be expired during lazy access.
    fn remove_expired(&mut self, key: &str) {
        self.entries.remove(key);
        self.sampler.remove(key);
        self.stats.record_expired_removals(1);
        self.stats.set_total_entries(self.entries.len());
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_cache_new() {
        let cache: Cache<String> = Cache::new(100).unwrap();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.max_capacity(), 100);
    }

    #[test]
    fn test_cache_new_zero_capacity() {
        let result: Result<Cache<String>> = Cache::new(0);
        assert_eq!(result.unwrap_err(), CacheError::InvalidCapacity(0));
    }

    #[test]
    fn test_cache_set_and_get() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", "value1".to_string(), Ttl::Infinite).unwrap();

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_get_nonexistent() {
        let mut cache: Cache<String> = Cache::new(100).unwrap();

        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_cache_overwrite_resets_ttl() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::from_secs(1).unwrap()).unwrap();
        cache.set("key1", 2, Ttl::Infinite).unwrap();

        assert_eq!(cache.get("key1"), Some(2));
        assert_eq!(cache.len(), 1);

        // The overwrite replaced the 1s TTL with Infinite
        sleep(Duration::from_millis(1100));
        assert_eq!(cache.get("key1"), Some(2));
    }

    #[test]
    fn test_cache_delete_idempotent() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::Infinite).unwrap();

        assert!(cache.delete("key1"));
        assert!(cache.is_empty());

        // Second delete of the same key is a no-op
        assert!(!cache.delete("key1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_contains_does_not_bump_freq() {
        let mut cache = Cache::new(100).unwrap();
        cache.set("key1", 1, Ttl::Infinite).unwrap();

        assert!(cache.contains("key1"));
        assert!(!cache.contains("other"));

        // Peeking leaves hit/miss counters untouched as well
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_ttl_expiration() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::from_secs(1).unwrap()).unwrap();

        assert_eq!(cache.get("key1"), Some(1));
        assert!(cache.contains("key1"));

        sleep(Duration::from_millis(1100));

        assert!(!cache.contains("key1"));
        assert_eq!(cache.get("key1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_contains_removes_expired() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::from_secs(1).unwrap()).unwrap();
        sleep(Duration::from_millis(1100));

        // Lazy expiry through the peek path removes the entry too
        assert!(!cache.contains("key1"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_capacity_bound_after_set() {
        let mut cache = Cache::new(3).unwrap();

        for i in 0..10 {
            cache.set(&format!("key{}", i), i, Ttl::Infinite).unwrap();
            assert!(cache.len() <= 3, "capacity bound violated: {}", cache.len());
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 7);
    }

    #[test]
    fn test_cache_sweep_reclaims_before_eviction() {
        let mut cache = Cache::new(2).unwrap();

        cache.set("dead", 1, Ttl::from_secs(1).unwrap()).unwrap();
        cache.set("live", 2, Ttl::Infinite).unwrap();
        sleep(Duration::from_millis(1100));

        // The expired entry is swept, so no live entry is evicted
        cache.set("new", 3, Ttl::Infinite).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("live"));
        assert!(cache.contains("new"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_cache_eviction_favors_cold_keys() {
        // Capacity small enough that the sample rate clamps to 1.0 and the
        // pool covers every entry, making the LFU choice deterministic.
        let mut cache = Cache::new(8).unwrap();
        assert_eq!(cache.sample_rate(), 1.0);

        for i in 0..8 {
            cache.set(&format!("key{}", i), i, Ttl::Infinite).unwrap();
        }
        for _ in 0..50 {
            cache.get("key0");
        }

        // Each insertion evicts one of the never-read keys, never the hot one
        for i in 8..12 {
            cache.set(&format!("key{}", i), i, Ttl::Infinite).unwrap();
            assert!(cache.contains("key0"), "hot key must survive eviction");
        }
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_cache_resize_validation() {
        let mut cache: Cache<i32> = Cache::new(10).unwrap();

        assert_eq!(cache.resize(0).unwrap_err(), CacheError::InvalidCapacity(0));
        cache.resize(5).unwrap();
        assert_eq!(cache.max_capacity(), 5);
    }

    #[test]
    fn test_cache_resize_updates_sample_rate() {
        let mut cache: Cache<i32> = Cache::new(64).unwrap();
        assert_eq!(cache.sample_rate(), 1.0);

        cache.resize(6400).unwrap();
        assert_eq!(cache.sample_rate(), MIN_SAMPLE_RATE);

        cache.resize(128).unwrap();
        assert_eq!(cache.sample_rate(), 0.5);
    }

    #[test]
    fn test_cache_shrink_below_len_then_insert() {
        let mut cache = Cache::new(10).unwrap();
        for i in 0..10 {
            cache.set(&format!("key{}", i), i, Ttl::Infinite).unwrap();
        }

        // Shrinking leaves the cache 8 entries over; the next insert must
        // reclaim all of them, not just one
        cache.resize(2).unwrap();
        cache.set("new", 99, Ttl::Infinite).unwrap();

        assert!(
            cache.len() <= 2,
            "capacity bound violated after set: len={} max=2",
            cache.len()
        );
        assert!(cache.contains("new"));
        assert_eq!(cache.stats().evictions, 9);
    }

    #[test]
    fn test_cache_resize_one_then_insert() {
        let mut cache = Cache::new(10).unwrap();
        cache.resize(1).unwrap();

        cache.set("a", 1, Ttl::Infinite).unwrap();
        cache.set("b", 2, Ttl::Infinite).unwrap();

        // Exactly one of the two keys survived
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("a") ^ cache.contains("b"));
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::Infinite).unwrap();
        cache.set("key2", 2, Ttl::Infinite).unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_entries, 0);
        assert_eq!(cache.get("key1"), None);
    }

    #[test]
    fn test_cache_sweep_expired() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::from_secs(1).unwrap()).unwrap();
        cache.set("key2", 2, Ttl::from_secs(10).unwrap()).unwrap();
        cache.set("key3", 3, Ttl::Infinite).unwrap();

        sleep(Duration::from_millis(1100));

        let removed = cache.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("key2"), Some(2));
        assert_eq!(cache.get("key3"), Some(3));
        assert_eq!(cache.stats().expired_removals, 1);
    }

    #[test]
    fn test_cache_sweep_never_removes_infinite_ttl() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("forever", 1, Ttl::Infinite).unwrap();
        for _ in 0..5 {
            assert_eq!(cache.sweep_expired(), 0);
        }
        assert_eq!(cache.get("forever"), Some(1));
    }

    #[test]
    fn test_cache_empty_key_rejected() {
        let mut cache = Cache::new(100).unwrap();

        let result = cache.set("", 1, Ttl::Infinite);
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_key_too_long_rejected() {
        let mut cache = Cache::new(100).unwrap();
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = cache.set(&long_key, 1, Ttl::Infinite);
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_cache_negative_ttl_rejected() {
        let cache: Cache<i32> = Cache::new(100).unwrap();

        // Negative lifetimes are rejected at Ttl construction, before any
        // cache state can be touched
        let err = Ttl::from_secs(-1).unwrap_err();
        assert_eq!(err, CacheError::InvalidTtl(-1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_stats_tracking() {
        let mut cache = Cache::new(100).unwrap();

        cache.set("key1", 1, Ttl::Infinite).unwrap();
        cache.get("key1"); // hit
        let _ = cache.get("nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }
}
