//! Error types for the bus tracker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Sppo Error Enum ==
/// Unified error type for the bus tracker.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SppoError {
    /// Upstream feed unreachable or returned a malformed payload
    #[error("Upstream feed error: {0}")]
    Upstream(String),

    /// Malformed caller input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Query produced zero results
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client exceeded the inbound request limit
    #[error("Too many requests, retry in {0}s")]
    RateLimited(u64),

    /// Cache misuse (e.g. key too long)
    #[error("Cache error: {0}")]
    Cache(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for SppoError {
    fn into_response(self) -> Response {
        let status = match &self {
            SppoError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SppoError::Validation(_) => StatusCode::BAD_REQUEST,
            SppoError::NotFound(_) => StatusCode::NOT_FOUND,
            SppoError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            SppoError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the bus tracker.
pub type Result<T> = std::result::Result<T, SppoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SppoError::Upstream("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SppoError::Validation("bad lat".into()), StatusCode::BAD_REQUEST),
            (SppoError::NotFound("linha 415".into()), StatusCode::NOT_FOUND),
            (SppoError::RateLimited(30), StatusCode::TOO_MANY_REQUESTS),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SppoError::Validation("lat out of range".into()).to_string(),
            "Invalid request: lat out of range"
        );
        assert_eq!(
            SppoError::RateLimited(12).to_string(),
            "Too many requests, retry in 12s"
        );
    }
}
