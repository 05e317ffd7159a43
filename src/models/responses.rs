//! Response DTOs for the bus tracker API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::time::Duration;

use serde::Serialize;

use crate::cache::NamespaceStats;
use crate::sppo::Snapshot;

/// Metadata attached to every vehicle list response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub total: usize,
    /// ISO 8601 response time
    pub timestamp: String,
    /// Handling time, e.g. `"12ms"`
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raio: Option<f64>,
}

impl ResponseMeta {
    pub fn new(total: usize, elapsed: Duration) -> Self {
        Self {
            total,
            timestamp: chrono::Utc::now().to_rfc3339(),
            duration: format!("{}ms", elapsed.as_millis()),
            linha: None,
            lat: None,
            lon: None,
            raio: None,
        }
    }
}

/// Body of the vehicle list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct VehiclesResponse {
    pub data: Snapshot,
    pub meta: ResponseMeta,
}

impl VehiclesResponse {
    pub fn new(data: Snapshot, elapsed: Duration) -> Self {
        let meta = ResponseMeta::new(data.len(), elapsed);
        Self { data, meta }
    }
}

/// Response body for `POST /api/sppo/cache/clear`
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
    pub timestamp: String,
}

impl ClearCacheResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared successfully".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub uptime_secs: u64,
    pub indexed_lines: usize,
    pub cache: NamespaceStats,
}

impl HealthResponse {
    pub fn healthy(uptime: Duration, indexed_lines: usize, cache: NamespaceStats) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: uptime.as_secs(),
            indexed_lines,
            cache,
        }
    }
}
