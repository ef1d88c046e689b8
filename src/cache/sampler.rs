//! Eviction Sampler Module
//!
//! Approximates "evict the globally least-frequently-used live entry"
//! without full scans: a bounded pool of candidate keys with their
//! last-known frequency is refreshed by random sampling, and victims are
//! drawn from the pool's minimum. Over successive refreshes the pool is
//! biased toward low-frequency keys, the same trade-off made by
//! sampling-based LFU eviction in production key-value caches.

use std::collections::HashMap;

use rand::Rng;

use crate::cache::{CacheEntry, EVICTION_POOL_SIZE};

// == Eviction Sampler ==
/// Bounded pool of eviction candidates refreshed by random sampling.
///
/// The pool holds at most `EVICTION_POOL_SIZE` `(key, freq)` pairs. It is
/// a view onto the entry map and owns nothing: members whose key has since
/// been deleted or expired are pruned before ever being treated as a
/// victim.
#[derive(Debug, Default)]
pub struct EvictionSampler {
    /// Candidate victims with their last-known frequency
    pool: Vec<(String, f64)>,
}

impl EvictionSampler {
    // == Constructor ==
    /// Creates a new empty sampler.
    pub fn new() -> Self {
        Self { pool: Vec::with_capacity(EVICTION_POOL_SIZE) }
    }

    // == Refresh ==
    /// Refreshes the candidate pool by sampling live entries.
    ///
    /// Each live entry is considered with probability `sample_rate`.
    /// Sampled entries are decayed first, so idle entries lose eviction
    /// priority in proportion to how long they have sat unused. A sampled
    /// entry is then pooled:
    /// - unconditionally while the pool has free slots;
    /// - otherwise it replaces the pool member with the highest frequency,
    ///   but only if its own frequency is lower;
    /// - a key already in the pool just has its recorded frequency updated.
    ///
    /// Sampling never blocks and never fails.
    pub fn refresh<V>(
        &mut self,
        entries: &mut HashMap<String, CacheEntry<V>>,
        sample_rate: f64,
        now_ms: u64,
    ) {
        let mut rng = rand::rng();
        let sample_rate = sample_rate.clamp(0.0, 1.0);

        for (key, entry) in entries.iter_mut() {
            if !rng.random_bool(sample_rate) {
                continue;
            }

            entry.decay(now_ms);
            let freq = entry.freq();

            if let Some(member) = self.pool.iter_mut().find(|(k, _)| k == key) {
                member.1 = freq;
            } else if self.pool.len() < EVICTION_POOL_SIZE {
                self.pool.push((key.clone(), freq));
            } else if let Some(max_idx) = self.max_freq_index() {
                if freq < self.pool[max_idx].1 {
                    self.pool[max_idx] = (key.clone(), freq);
                }
            }
        }
    }

    // == Pick Victim ==
    /// Removes and returns the pool member with the lowest frequency.
    ///
    /// Stale members (keys no longer present in `entries`) are pruned
    /// first. Ties are broken by first-found order. Returns None if the
    /// pool is empty after pruning; the caller falls back to evicting an
    /// arbitrary live entry in that case.
    pub fn pick_victim<V>(&mut self, entries: &HashMap<String, CacheEntry<V>>) -> Option<String> {
        self.pool.retain(|(key, _)| entries.contains_key(key));

        let min_idx = self
            .pool
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)?;

        Some(self.pool.swap_remove(min_idx).0)
    }

    // == Remove ==
    /// Drops a key from the pool if present (view maintenance on delete).
    pub fn remove(&mut self, key: &str) {
        self.pool.retain(|(k, _)| k != key);
    }

    // == Clear ==
    /// Empties the pool.
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    // == Length ==
    /// Returns the number of pooled candidates.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Index of the pool member with the highest frequency.
    fn max_freq_index(&self) -> Option<usize> {
        self.pool
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }
}
