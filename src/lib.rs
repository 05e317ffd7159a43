//! SPPO Tracker - Rio bus GPS feed cache and query server
//!
//! Polls the SPPO feed, keeps the active vehicles in TTL caches and a line
//! index, and serves line, proximity and stats queries over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod sppo;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use sppo::BusDataService;
pub use tasks::spawn_cleanup_task;
