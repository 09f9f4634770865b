//! Expiry Sweep Task
//!
//! Expired entries are already treated as misses on read. The sweep only
//! bounds memory held by keys nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically removes expired entries from
/// `cache`.
///
/// Returns the task handle so shutdown can abort it.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting expiry sweep"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                info!(removed, "Expiry sweep removed expired entries");
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}
