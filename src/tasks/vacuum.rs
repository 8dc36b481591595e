//! Vacuum Task
//!
//! Background task that periodically sweeps the cache: index pointers whose
//! bytes the rings have recycled are dropped, and records past their expiry
//! are tombstoned without waiting for someone to look them up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::Cache;

/// Spawns a background task that periodically vacuums the cache.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep visits the shards one at a time under their
/// own locks, so the cache stays responsive while it runs.
///
/// # Arguments
/// * `cache` - Shared cache instance to sweep
/// * `vacuum_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::new(64 * 1024 * 1024));
/// let vacuum_handle = spawn_vacuum_task(cache.clone(), 60);
/// // Later, during shutdown:
/// vacuum_handle.abort();
/// ```
pub fn spawn_vacuum_task(cache: Arc<Cache>, vacuum_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(vacuum_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting vacuum task with interval of {} seconds",
            vacuum_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            // Sweep every shard and log what came back
            match cache.vacuum() {
                Ok(reclaimed) if reclaimed > 0 => {
                    info!("Vacuum: reclaimed {} dead records", reclaimed);
                }
                Ok(_) => {
                    debug!("Vacuum: nothing to reclaim");
                }
                Err(err) => {
                    error!("Vacuum sweep failed: {}", err);
                }
            }
        }
    })
}
