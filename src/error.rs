//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! All variants are local, synchronous validation errors surfaced
//! immediately to the caller; none are retried internally, and no
//! operation mutates state before raising one.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, PartialEq)]
pub enum CacheError {
    /// A finite TTL was negative
    #[error("Invalid TTL: {0} seconds (must be non-negative)")]
    InvalidTtl(i64),

    /// A capacity of zero was requested
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// A key failed validation
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
