//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Janitor: sweeps expired cache entries at a configured interval

mod janitor;

pub use janitor::spawn_janitor;
