//! API Handlers
//!
//! HTTP request handlers for each bus tracker endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::rate_limit::RateLimiter;
use crate::config::Config;
use crate::error::{Result, SppoError};
use crate::models::{
    validate_line, ClearCacheResponse, HealthResponse, PositionParams, VehiclesResponse,
};
use crate::sppo::{BusDataService, FleetStats};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BusDataService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: BusDataService, rate_limiter: RateLimiter) -> Self {
        Self {
            service: Arc::new(service),
            rate_limiter: Arc::new(rate_limiter),
            started_at: Instant::now(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wires the HTTP feed, cache namespaces and rate limiter from the Config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            BusDataService::from_config(config)?,
            RateLimiter::from_config(config),
        ))
    }
}

/// Handler for GET /api/sppo
pub async fn all_vehicles_handler(State(state): State<AppState>) -> Result<Json<VehiclesResponse>> {
    let started = Instant::now();
    let vehicles = state.service.fetch_active_vehicles().await?;

    Ok(Json(VehiclesResponse::new(vehicles, started.elapsed())))
}

/// Handler for GET /api/sppo/linha/:linha
///
/// 404 when no vehicle matches the line.
pub async fn line_handler(
    State(state): State<AppState>,
    Path(linha): Path<String>,
) -> Result<Json<VehiclesResponse>> {
    let started = Instant::now();
    let linha = validate_line(&linha)?;

    let vehicles = state.service.get_by_line(&linha).await?;
    if vehicles.is_empty() {
        return Err(SppoError::NotFound(format!(
            "No active vehicles found for linha {}",
            linha
        )));
    }

    let mut response = VehiclesResponse::new(vehicles, started.elapsed());
    response.meta.linha = Some(linha);
    Ok(Json(response))
}

/// Handler for GET /api/sppo/posicao?lat&lon&raio
///
/// 404 when no vehicle lies within the radius.
pub async fn position_handler(
    State(state): State<AppState>,
    Query(params): Query<PositionParams>,
) -> Result<Json<VehiclesResponse>> {
    let started = Instant::now();
    let query = params.validate()?;

    let vehicles = state
        .service
        .get_by_position(query.lat, query.lon, query.radius_km)
        .await?;
    if vehicles.is_empty() {
        return Err(SppoError::NotFound(format!(
            "No active vehicles within {} km of ({}, {})",
            query.radius_km, query.lat, query.lon
        )));
    }

    let mut response = VehiclesResponse::new(vehicles, started.elapsed());
    response.meta.lat = Some(query.lat);
    response.meta.lon = Some(query.lon);
    response.meta.raio = Some(query.radius_km);
    Ok(Json(response))
}

/// Handler for GET /api/sppo/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<FleetStats>> {
    Ok(Json(state.service.get_stats().await?))
}

/// Handler for POST /api/sppo/cache/clear
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.service.clear_caches().await;
    Json(ClearCacheResponse::cleared())
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let indexed_lines = state.service.line_index().await.line_count();
    let cache = state.service.cache_stats().await;

    Json(HealthResponse::healthy(
        state.started_at.elapsed(),
        indexed_lines,
        cache,
    ))
}
