//! API Module
//!
//! HTTP handlers and routing for the bus tracker REST API.
//!
//! # Endpoints
//! - `GET /api/sppo` - All active vehicles
//! - `GET /api/sppo/linha/:linha` - Vehicles on a line
//! - `GET /api/sppo/posicao?lat&lon&raio` - Vehicles near a point
//! - `GET /api/sppo/stats` - Fleet statistics
//! - `POST /api/sppo/cache/clear` - Drop caches and line index
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod rate_limit;
pub mod routes;

pub use handlers::*;
pub use rate_limit::RateLimiter;
pub use routes::create_router;
