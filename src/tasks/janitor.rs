//! Cache Janitor Task
//!
//! Background task that periodically sweeps expired cache entries.
//!
//! The janitor only ever calls the cache's expiry sweep; eviction is
//! capacity-triggered and stays inside `set`. Its purpose is to reclaim
//! memory from TTL-expired entries before the cache fills up with dead
//! but un-swept ones. A missed tick is recoverable: the next tick or
//! lazy expiry on access covers it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. It acquires a write lock on the cache for the duration
/// of each sweep, so every sweep is one whole critical section.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(Cache::new(1000)?));
/// let janitor_handle = spawn_janitor(cache.clone(), 60);
/// // Later, during shutdown:
/// janitor_handle.abort();
/// ```
pub fn spawn_janitor<V>(cache: Arc<RwLock<Cache<V>>>, interval_secs: u64) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting janitor task with interval of {} seconds",
            interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            // Acquire write lock and sweep expired entries
            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.sweep_expired()
            };

            // Log sweep statistics
            if removed > 0 {
                info!("Janitor sweep: removed {} expired entries", removed);
            } else {
                debug!("Janitor sweep: no expired entries found");
            }
        }
    })
}
