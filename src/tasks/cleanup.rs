//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::NamespacedCache;

/// Spawns a background task that sweeps expired entries from all three
/// namespaces every `cleanup_interval_secs`.
///
/// Reads never return expired entries on their own; the sweep only bounds
/// memory held by keys nobody asks for again (old position queries).
///
/// Returns the task handle so shutdown can abort it.
pub fn spawn_cleanup_task<V>(
    cache: Arc<RwLock<NamespacedCache<V>>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
