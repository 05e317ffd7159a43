//! Observability hook for the bus data service.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::CacheNamespace;
use crate::error::SppoError;

/// Why the stale snapshot was served instead of fresh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// An upstream fetch happened too recently
    Throttled,
    /// The upstream fetch failed
    UpstreamFailed,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StaleReason::Throttled => "throttled",
            StaleReason::UpstreamFailed => "upstream failed",
        })
    }
}

/// Called by the service at fixed points of its pipeline.
///
/// Every method defaults to a no-op.
pub trait ServiceObserver: Send + Sync {
    fn fetch_started(&self) {}

    fn fetch_finished(&self, _raw: usize, _active: usize, _elapsed: Duration) {}

    fn fetch_failed(&self, _error: &SppoError) {}

    fn stale_served(&self, _reason: StaleReason, _vehicles: usize) {}

    fn cache_hit(&self, _ns: CacheNamespace, _key: &str) {}

    fn cache_miss(&self, _ns: CacheNamespace, _key: &str) {}

    fn index_rebuilt(&self, _lines: usize, _vehicles: usize) {}
}

/// Default observer: emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ServiceObserver for TracingObserver {
    fn fetch_started(&self) {
        debug!("Fetching SPPO feed");
    }

    fn fetch_finished(&self, raw: usize, active: usize, elapsed: Duration) {
        info!(
            raw,
            active,
            elapsed_ms = elapsed.as_millis() as u64,
            "SPPO feed fetched"
        );
    }

    fn fetch_failed(&self, error: &SppoError) {
        warn!(%error, "SPPO feed fetch failed");
    }

    fn stale_served(&self, reason: StaleReason, vehicles: usize) {
        warn!(%reason, vehicles, "Serving stale snapshot");
    }

    fn cache_hit(&self, ns: CacheNamespace, key: &str) {
        debug!(namespace = %ns, key, "Cache hit");
    }

    fn cache_miss(&self, ns: CacheNamespace, key: &str) {
        debug!(namespace = %ns, key, "Cache miss");
    }

    fn index_rebuilt(&self, lines: usize, vehicles: usize) {
        debug!(lines, vehicles, "Line index rebuilt");
    }
}
