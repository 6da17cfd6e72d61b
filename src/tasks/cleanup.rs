//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the memory backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryBackend;

/// Spawns a background task that periodically sweeps expired entries.
///
/// Expired entries already read as absent; the sweep only reclaims their memory.
///
/// # Arguments
/// * `backend` - shared memory backend to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during shutdown.
///
/// # Example
/// ```ignore
/// let backend = Arc::new(MemoryBackend::new());
/// let cleanup_handle = spawn_cleanup_task(backend.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    backend: Arc<MemoryBackend>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
