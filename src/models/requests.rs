//! Request DTOs for the bus tracker API
//!
//! Validates path and query input before it reaches the service.

use serde::Deserialize;

use crate::error::{Result, SppoError};
use crate::sppo::DEFAULT_RADIUS_KM;

/// Longest accepted line identifier, after trimming.
pub const MAX_LINE_LENGTH: usize = 20;

pub const MIN_RADIUS_KM: f64 = 0.1;
pub const MAX_RADIUS_KM: f64 = 50.0;

/// Validates the `:linha` path segment and returns it trimmed.
///
/// Accepts letters, digits, spaces, `-` and `_`.
pub fn validate_line(raw: &str) -> Result<String> {
    let line = raw.trim();
    if line.is_empty() {
        return Err(SppoError::Validation("linha cannot be empty".to_string()));
    }
    if line.chars().count() > MAX_LINE_LENGTH {
        return Err(SppoError::Validation(format!(
            "linha exceeds maximum length of {} characters",
            MAX_LINE_LENGTH
        )));
    }
    if !line
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(SppoError::Validation(
            "linha may only contain letters, digits, spaces, '-' and '_'".to_string(),
        ));
    }
    Ok(line.to_string())
}

/// Raw query string for `GET /api/sppo/posicao`.
///
/// Kept as strings so malformed numbers surface as our own 400 body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub raio: Option<String>,
}

/// Validated position query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
}

fn parse_bounded(name: &str, raw: Option<&str>, min: f64, max: f64) -> Result<Option<f64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| SppoError::Validation(format!("{name} must be a number")))?;
    if !(min..=max).contains(&value) {
        return Err(SppoError::Validation(format!(
            "{name} must be between {min} and {max}"
        )));
    }
    Ok(Some(value))
}

impl PositionParams {
    /// `lat` in [-90, 90] and `lon` in [-180, 180] are required; `raio` is
    /// optional in [0.1, 50] and defaults to 1 km.
    pub fn validate(&self) -> Result<PositionQuery> {
        let lat = parse_bounded("lat", self.lat.as_deref(), -90.0, 90.0)?
            .ok_or_else(|| SppoError::Validation("lat is required".to_string()))?;
        let lon = parse_bounded("lon", self.lon.as_deref(), -180.0, 180.0)?
            .ok_or_else(|| SppoError::Validation("lon is required".to_string()))?;
        let radius_km = parse_bounded("raio", self.raio.as_deref(), MIN_RADIUS_KM, MAX_RADIUS_KM)?
            .unwrap_or(DEFAULT_RADIUS_KM);

        Ok(PositionQuery { lat, lon, radius_km })
    }
}
