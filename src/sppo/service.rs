//! Bus Data Service
//!
//! Owns the cache namespaces, the line index and the upstream feed, and
//! answers every query the API exposes.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use super::{
    collect_active, is_active, normalize_line_key, FeedSource, FleetStats, HttpFeed, LineIndex,
    ServiceObserver, StaleReason, TracingObserver, VehicleReport,
};
use crate::cache::{CacheNamespace, NamespaceStats, NamespacedCache};
use crate::config::Config;
use crate::error::Result;
use crate::geo::bounded_distance_km;

/// Shared, immutable result set.
pub type Snapshot = Arc<Vec<VehicleReport>>;

/// General-namespace key of the full active set.
pub const ALL_VEHICLES_KEY: &str = "sppo:all";
/// General-namespace key of the long-lived fallback copy.
pub const STALE_VEHICLES_KEY: &str = "sppo:all:stale";
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

// == Service Settings ==
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// TTL of the full active set, also the index max age (seconds)
    pub general_ttl: u64,
    /// TTL of the stale fallback (seconds)
    pub stale_ttl: u64,
    /// TTL of line and position query results (seconds)
    pub query_ttl: u64,
    /// An upstream fetch newer than this prefers the stale snapshot
    pub throttle_window: Duration,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            general_ttl: config.cache_ttl,
            stale_ttl: config.cache_stale_ttl,
            ..Self::default()
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            general_ttl: 300,
            stale_ttl: 1800,
            query_ttl: 120,
            throttle_window: Duration::minutes(5),
        }
    }
}

// == Bus Data Service ==
pub struct BusDataService {
    feed: Arc<dyn FeedSource>,
    observer: Arc<dyn ServiceObserver>,
    cache: Arc<RwLock<NamespacedCache<Snapshot>>>,
    /// Replaced whole on rebuild, never mutated in place
    index: RwLock<Arc<LineIndex>>,
    last_fetch: RwLock<Option<DateTime<Utc>>>,
    settings: ServiceSettings,
}

impl BusDataService {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        cache: NamespacedCache<Snapshot>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            feed,
            observer: Arc::new(TracingObserver),
            cache: Arc::new(RwLock::new(cache)),
            index: RwLock::new(Arc::new(LineIndex::default())),
            last_fetch: RwLock::new(None),
            settings,
        }
    }

    /// Builds the service against the HTTP feed described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let feed = HttpFeed::from_config(config)?;
        Ok(Self::new(
            Arc::new(feed),
            NamespacedCache::from_config(config),
            ServiceSettings::from_config(config),
        ))
    }

    pub fn with_observer(mut self, observer: Arc<dyn ServiceObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Handle for the background expiry sweep.
    pub fn cache(&self) -> Arc<RwLock<NamespacedCache<Snapshot>>> {
        self.cache.clone()
    }

    pub async fn cache_stats(&self) -> NamespaceStats {
        self.cache.read().await.stats()
    }

    /// Current line index (a cheap shared handle).
    pub async fn line_index(&self) -> Arc<LineIndex> {
        self.index.read().await.clone()
    }

    async fn cached(&self, ns: CacheNamespace, key: &str) -> Option<Snapshot> {
        let hit = self.cache.write().await.get(ns, key);
        match hit {
            Some(_) => self.observer.cache_hit(ns, key),
            None => self.observer.cache_miss(ns, key),
        }
        hit
    }

    async fn store(&self, ns: CacheNamespace, key: String, value: Snapshot, ttl: Option<u64>) {
        if let Err(e) = self.cache.write().await.set(ns, key.clone(), value, ttl) {
            warn!(namespace = %ns, key = %key, error = %e, "Failed to cache result");
        }
    }

    async fn stale_snapshot(&self) -> Option<Snapshot> {
        self.cached(CacheNamespace::General, STALE_VEHICLES_KEY).await
    }

    async fn fetched_recently(&self, now: DateTime<Utc>) -> bool {
        match *self.last_fetch.read().await {
            Some(at) => now - at < self.settings.throttle_window,
            None => false,
        }
    }

    async fn publish_index(&self, vehicles: &[VehicleReport], now: DateTime<Utc>) {
        let index = Arc::new(LineIndex::build(vehicles, now));
        self.observer
            .index_rebuilt(index.line_count(), index.vehicle_count());
        *self.index.write().await = index;
    }

    // == Fetch Active Vehicles ==
    /// Returns the full active-vehicle set.
    ///
    /// Order: fresh cache, then the stale snapshot if upstream was hit within
    /// the throttle window, then a real upstream fetch. A failed fetch falls
    /// back to the stale snapshot before surfacing the error.
    pub async fn fetch_active_vehicles(&self) -> Result<Snapshot> {
        if let Some(vehicles) = self.cached(CacheNamespace::General, ALL_VEHICLES_KEY).await {
            return Ok(vehicles);
        }

        if self.fetched_recently(Utc::now()).await {
            if let Some(stale) = self.stale_snapshot().await {
                self.observer.stale_served(StaleReason::Throttled, stale.len());
                return Ok(stale);
            }
        }

        self.refresh().await
    }

    async fn refresh(&self) -> Result<Snapshot> {
        self.observer.fetch_started();
        let started = Instant::now();

        let raw = match self.feed.fetch_raw().await {
            Ok(raw) => raw,
            Err(err) => {
                self.observer.fetch_failed(&err);
                return match self.stale_snapshot().await {
                    Some(stale) => {
                        self.observer
                            .stale_served(StaleReason::UpstreamFailed, stale.len());
                        Ok(stale)
                    }
                    None => Err(err),
                };
            }
        };

        let now = Utc::now();
        let vehicles: Snapshot = Arc::new(collect_active(&raw, now));

        self.store(
            CacheNamespace::General,
            ALL_VEHICLES_KEY.to_string(),
            vehicles.clone(),
            Some(self.settings.general_ttl),
        )
        .await;
        self.store(
            CacheNamespace::General,
            STALE_VEHICLES_KEY.to_string(),
            vehicles.clone(),
            Some(self.settings.stale_ttl),
        )
        .await;
        self.publish_index(&vehicles, now).await;
        *self.last_fetch.write().await = Some(now);

        self.observer
            .fetch_finished(raw.len(), vehicles.len(), started.elapsed());
        Ok(vehicles)
    }

    // == Get By Line ==
    /// Vehicles on `line` (case and surrounding whitespace ignored).
    ///
    /// Falls back to containment matching, and refreshes the index once when
    /// nothing matched and the index is empty or older than the general TTL.
    /// An empty result is not an error.
    pub async fn get_by_line(&self, line: &str) -> Result<Snapshot> {
        let key = normalize_line_key(line);
        if key.is_empty() {
            return Ok(Arc::new(Vec::new()));
        }

        let cache_key = format!("line:{key}");
        if let Some(hit) = self.cached(CacheNamespace::Line, &cache_key).await {
            return Ok(hit);
        }

        let mut matches = self.line_index().await.lookup(&key);

        if matches.is_empty() && self.index_is_stale().await {
            let vehicles = self.fetch_active_vehicles().await?;
            // Served from cache or stale: the fetch did not rebuild
            if self.index_is_stale().await {
                self.publish_index(&vehicles, Utc::now()).await;
            }
            matches = self.line_index().await.lookup(&key);
        }

        let matches = Arc::new(matches);
        if !matches.is_empty() {
            self.store(
                CacheNamespace::Line,
                cache_key,
                matches.clone(),
                Some(self.settings.query_ttl),
            )
            .await;
        }
        Ok(matches)
    }

    async fn index_is_stale(&self) -> bool {
        let max_age = Duration::seconds(self.settings.general_ttl as i64);
        self.line_index().await.is_stale(Utc::now(), max_age)
    }

    // == Get By Position ==
    /// Active vehicles within `radius_km` of (`lat`, `lon`).
    pub async fn get_by_position(&self, lat: f64, lon: f64, radius_km: f64) -> Result<Snapshot> {
        let cache_key = format!("pos:{lat:.4}:{lon:.4}:{radius_km}");
        if let Some(hit) = self.cached(CacheNamespace::Position, &cache_key).await {
            return Ok(hit);
        }

        let vehicles = self.fetch_active_vehicles().await?;
        let now = Utc::now();
        let nearby: Snapshot = Arc::new(
            vehicles
                .iter()
                .filter(|v| v.has_position())
                .filter(|v| bounded_distance_km(lat, lon, v.latitude, v.longitude) <= radius_km)
                .filter(|v| is_active(v, now))
                .cloned()
                .collect(),
        );

        self.store(
            CacheNamespace::Position,
            cache_key,
            nearby.clone(),
            Some(self.settings.query_ttl),
        )
        .await;
        Ok(nearby)
    }

    // == Get Stats ==
    pub async fn get_stats(&self) -> Result<FleetStats> {
        let vehicles = self.fetch_active_vehicles().await?;
        Ok(FleetStats::from_reports(&vehicles))
    }

    // == Clear Caches ==
    /// Drops every namespace (stale snapshot included), the line index and
    /// the throttle clock, so the next read goes upstream.
    pub async fn clear_caches(&self) {
        self.cache.write().await.clear(None);
        *self.index.write().await = Arc::new(LineIndex::default());
        *self.last_fetch.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SppoError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted feed that counts calls.
    struct StubFeed {
        response: Mutex<Result<Vec<Value>>>,
        calls: AtomicUsize,
    }

    impl StubFeed {
        fn new(records: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Ok(records)),
                calls: AtomicUsize::new(0),
            })
        }

        fn fail(&self) {
            *self.response.lock().unwrap() = Err(SppoError::Upstream("connection refused".into()));
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedSource for StubFeed {
        async fn fetch_raw(&self) -> Result<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.lock().unwrap().clone()
        }
    }

    fn record(ordem: &str, linha: &str, lat: &str, lon: &str, speed: &str, minutes_ago: i64) -> Value {
        let observed = Utc::now() - Duration::minutes(minutes_ago);
        json!({
            "ordem": ordem,
            "linha": linha,
            "latitude": lat,
            "longitude": lon,
            "velocidade": speed,
            "datahora": observed.timestamp_millis().to_string(),
        })
    }

    fn fleet() -> Vec<Value> {
        vec![
            record("A1", "415", "-22,9068", "-43,1729", "30", 0),
            record("A2", "415", "-22,9100", "-43,1750", "0", 2),
            record("A3", "SP415", "-22,9500", "-43,1900", "12", 1),
            record("A4", "232", "-22,9070", "-43,1730", "0", 3),
            // Stopped and silent for 10 minutes: filtered out
            record("A5", "232", "-22,9068", "-43,1729", "0", 10),
            // No usable coordinates
            record("A6", "100", "x", "y", "20", 0),
        ]
    }

    fn service(feed: Arc<StubFeed>) -> BusDataService {
        BusDataService::new(
            feed,
            NamespacedCache::new(1000, 300, 180, 120),
            ServiceSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_fetch_filters_and_caches() {
        let feed = StubFeed::new(fleet());
        let service = service(feed.clone());

        let vehicles = service.fetch_active_vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 5);
        assert!(vehicles.iter().all(|v| v.vehicle_id != "A5"));

        let again = service.fetch_active_vehicles().await.unwrap();
        assert!(Arc::ptr_eq(&vehicles, &again));
        assert_eq!(feed.calls(), 1);
        assert_eq!(service.line_index().await.line_count(), 4);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_snapshot_propagates() {
        let feed = StubFeed::new(vec![]);
        feed.fail();
        let service = service(feed);

        let result = service.fetch_active_vehicles().await;
        assert!(matches!(result, Err(SppoError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_stale() {
        let feed = StubFeed::new(fleet());
        let service = service(feed.clone());
        service.fetch_active_vehicles().await.unwrap();

        // Fresh entry gone, stale one kept, throttle clock reset
        service
            .cache()
            .write()
            .await
            .delete(CacheNamespace::General, ALL_VEHICLES_KEY);
        *service.last_fetch.write().await = None;
        feed.fail();

        let vehicles = service.fetch_active_vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 5);
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_recent_fetch_serves_stale_without_upstream() {
        let feed = StubFeed::new(fleet());
        let service = service(feed.clone());
        service.fetch_active_vehicles().await.unwrap();

        service
            .cache()
            .write()
            .await
            .delete(CacheNamespace::General, ALL_VEHICLES_KEY);

        let vehicles = service.fetch_active_vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 5);
        assert_eq!(feed.calls(), 1, "throttled read must not hit upstream");
    }

    #[tokio::test]
    async fn test_get_by_line_is_cached() {
        let feed = StubFeed::new(fleet());
        let service = service(feed.clone());

        let first = service.get_by_line("415").await.unwrap();
        let second = service.get_by_line("415").await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(
            serde_json::to_string(&*first).unwrap(),
            serde_json::to_string(&*second).unwrap()
        );
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_by_line_normalizes_input() {
        let service = service(StubFeed::new(fleet()));

        let plain = service.get_by_line("415").await.unwrap();
        let padded = service.get_by_line(" 415 ").await.unwrap();
        let upper = service.get_by_line("SP415").await.unwrap();
        let lower = service.get_by_line("sp415").await.unwrap();

        assert_eq!(plain, padded);
        assert_eq!(upper, lower);
        assert_eq!(upper[0].vehicle_id, "A3");
    }

    #[tokio::test]
    async fn test_get_by_line_substring_fallback() {
        let service = service(StubFeed::new(fleet()));

        let ids: Vec<String> = service
            .get_by_line("sp4")
            .await
            .unwrap()
            .iter()
            .map(|v| v.vehicle_id.clone())
            .collect();
        assert_eq!(ids, ["A3"]);
    }

    #[tokio::test]
    async fn test_get_by_line_no_match_is_empty() {
        let feed = StubFeed::new(fleet());
        let service = service(feed.clone());

        assert!(service.get_by_line("999").await.unwrap().is_empty());
        assert!(service.get_by_line("   ").await.unwrap().is_empty());
        // Fresh index after the first miss: no further upstream calls
        assert!(service.get_by_line("999").await.unwrap().is_empty());
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_by_position_within_radius() {
        let service = service(StubFeed::new(fleet()));
        let (lat, lon) = (-22.9068, -43.1729);

        let nearby = service.get_by_position(lat, lon, 1.0).await.unwrap();
        let mut ids: Vec<_> = nearby.iter().map(|v| v.vehicle_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, ["A1", "A2", "A4"]);
        for v in nearby.iter() {
            assert!(crate::geo::haversine_km(lat, lon, v.latitude, v.longitude) <= 1.0);
        }

        let wider = service.get_by_position(lat, lon, 10.0).await.unwrap();
        assert_eq!(wider.len(), 4);
    }

    #[tokio::test]
    async fn test_get_by_position_shrinking_radius() {
        let service = service(StubFeed::new(fleet()));
        let mut previous = usize::MAX;

        for radius in [10.0, 5.0, 1.0, 0.3, 0.1, 0.01] {
            let count = service
                .get_by_position(-22.9068, -43.1729, radius)
                .await
                .unwrap()
                .len();
            assert!(count <= previous, "radius {radius} grew the result");
            previous = count;
        }
    }

    #[tokio::test]
    async fn test_get_stats() {
        let service = service(StubFeed::new(fleet()));

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.count_by_line["415"], 2);
        assert_eq!(stats.count_by_line["232"], 1);
        assert_eq!(stats.avg_speed_kmh, 12.4);
        assert!(stats.last_update.is_some());
    }

    #[tokio::test]
    async fn test_get_stats_empty() {
        let service = service(StubFeed::new(vec![]));

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_speed_kmh, 0.0);
        assert!(stats.count_by_line.is_empty());
        assert!(stats.last_update.is_none());
    }

    #[tokio::test]
    async fn test_clear_caches_forces_upstream_fetch() {
        let feed = StubFeed::new(fleet());
        let service = service(feed.clone());
        service.fetch_active_vehicles().await.unwrap();
        service.get_by_line("415").await.unwrap();

        service.clear_caches().await;
        assert!(service.line_index().await.is_empty());

        service.fetch_active_vehicles().await.unwrap();
        assert_eq!(feed.calls(), 2);
        assert_eq!(service.line_index().await.line_count(), 4);
    }

    #[derive(Default)]
    struct CountingObserver {
        hits: AtomicUsize,
        rebuilds: AtomicUsize,
    }

    impl ServiceObserver for CountingObserver {
        fn cache_hit(&self, _ns: CacheNamespace, _key: &str) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }

        fn index_rebuilt(&self, _lines: usize, _vehicles: usize) {
            self.rebuilds.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_observer_is_notified() {
        let observer = Arc::new(CountingObserver::default());
        let service = service(StubFeed::new(fleet())).with_observer(observer.clone());

        service.fetch_active_vehicles().await.unwrap();
        service.fetch_active_vehicles().await.unwrap();

        assert_eq!(observer.hits.load(Ordering::SeqCst), 1);
        assert_eq!(observer.rebuilds.load(Ordering::SeqCst), 1);
    }
}
