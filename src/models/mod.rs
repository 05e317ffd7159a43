//! Request and Response models for the bus tracker API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! validating query input and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_line, PositionParams, PositionQuery};
pub use responses::{ClearCacheResponse, HealthResponse, ResponseMeta, VehiclesResponse};
