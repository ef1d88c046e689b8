//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and
//! frequency metadata.
//!
//! Expiry (the hard TTL deadline) and frequency (the soft usage signal)
//! are tracked separately: a value can be bound to a fixed lifetime,
//! evicted in usage order under capacity pressure, or both.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cache::FREQ_DECAY_RATE;
use crate::error::{CacheError, Result};

// == Ttl ==
/// Configured lifetime of a cache entry.
///
/// `Infinite` is an explicit variant: entries that never expire carry it
/// instead of a numeric sentinel, so `expires_at` is `None` exactly when
/// the TTL is infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry expires this long after creation or its last TTL reset
    Finite(Duration),
    /// Entry never expires
    Infinite,
}

impl Ttl {
    // == From Seconds ==
    /// Builds a finite TTL from a signed second count.
    ///
    /// This is the validation boundary for caller-supplied lifetimes:
    /// negative values are rejected here, so every constructed `Ttl`
    /// is valid from then on.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidTtl` if `secs` is negative.
    pub fn from_secs(secs: i64) -> Result<Self> {
        if secs < 0 {
            return Err(CacheError::InvalidTtl(secs));
        }
        Ok(Ttl::Finite(Duration::from_secs(secs as u64)))
    }

    // == Is Infinite ==
    /// Returns true if this TTL never expires.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Ttl::Infinite)
    }

    /// Returns the lifetime in milliseconds, or None for `Infinite`.
    ///
    /// Saturates at `u64::MAX`, so an absurdly large finite TTL behaves
    /// like an entry that effectively never expires instead of wrapping.
    fn as_millis(&self) -> Option<u64> {
        match self {
            Ttl::Finite(d) => Some(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            Ttl::Infinite => None,
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value, expiry, and frequency metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Configured lifetime
    ttl: Ttl,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    expires_at: Option<u64>,
    /// Timestamp of the last successful read (Unix milliseconds)
    last_used_at: u64,
    /// Approximate usage frequency; bumped on read, decayed while idle
    freq: f64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// Frequency starts at zero: only reads increase it, pure existence
    /// in the map does not.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Lifetime of the entry
    /// * `now_ms` - Current time (Unix milliseconds)
    pub fn new(value: V, ttl: Ttl, now_ms: u64) -> Self {
        Self {
            value,
            ttl,
            expires_at: ttl.as_millis().map(|ms| now_ms.saturating_add(ms)),
            last_used_at: now_ms,
            freq: 0.0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is considered expired when the current
    /// time is greater than or equal to the expiration time. This ensures
    /// that once the TTL duration has fully elapsed, the entry is
    /// immediately expired.
    ///
    /// # Returns
    /// - `true` if the entry has a finite TTL and `now_ms` >= expiration time
    /// - `false` if the TTL is infinite or hasn't elapsed
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Reset TTL ==
    /// Resets the expiration deadline, optionally replacing the TTL.
    ///
    /// With `Some(ttl)` the configured lifetime is replaced; with `None`
    /// the existing lifetime is kept and only the deadline moves forward
    /// from `now_ms` (a "touch" that does not change the TTL itself).
    pub fn reset_ttl(&mut self, new_ttl: Option<Ttl>, now_ms: u64) {
        if let Some(ttl) = new_ttl {
            self.ttl = ttl;
        }
        self.expires_at = self.ttl.as_millis().map(|ms| now_ms.saturating_add(ms));
    }

    // == Read ==
    /// Records a successful read and returns the stored value.
    ///
    /// Increments the frequency by 1 and refreshes `last_used_at`. This is
    /// the only operation that increases frequency.
    pub fn read(&mut self, now_ms: u64) -> &V {
        self.freq += 1.0;
        self.last_used_at = now_ms;
        &self.value
    }

    // == Decay ==
    /// Decays the frequency in proportion to idle time.
    ///
    /// Reduces `freq` by `1 + FREQ_DECAY_RATE * idle_seconds`, floored at
    /// zero, where idle time is measured since the last read. Invoked
    /// opportunistically during eviction-candidate sampling rather than on
    /// a timer, so long-idle entries lose eviction priority even before
    /// their TTL expires.
    pub fn decay(&mut self, now_ms: u64) {
        let idle_secs = now_ms.saturating_sub(self.last_used_at) as f64 / 1000.0;
        self.freq = (self.freq - (1.0 + FREQ_DECAY_RATE * idle_secs)).max(0.0);
    }

    // == Frequency ==
    /// Returns the current approximate usage frequency.
    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Returns the configured lifetime.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Returns the timestamp of the last successful read (Unix milliseconds).
    pub fn last_used_at(&self) -> u64 {
        self.last_used_at
    }

    /// Returns the expiration timestamp (Unix milliseconds), or None if
    /// the entry never expires.
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if the entry never
    /// expires.
    ///
    /// This method is useful for debugging and statistics purposes.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has a TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now_ms))
    }

    /// Returns remaining TTL in seconds, or None if the entry never expires.
    pub fn ttl_remaining(&self, now_ms: u64) -> Option<u64> {
        self.ttl_remaining_ms(now_ms).map(|ms| ms / 1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
