//! SPPO Module
//!
//! Bus data acquisition and queries: upstream feed, normalization, line
//! index, proximity filter and fleet statistics.

mod feed;
mod index;
mod model;
mod normalize;
mod observer;
mod service;

pub use feed::{into_array, FeedSource, HttpFeed};
pub use index::LineIndex;
pub use model::{FleetStats, VehicleReport};
pub use normalize::{
    collect_active, is_active, normalize_line_key, normalize_record, parse_decimal,
    ACTIVE_WINDOW_MINUTES, UNKNOWN_LINE,
};
pub use observer::{ServiceObserver, StaleReason, TracingObserver};
pub use service::{
    BusDataService, ServiceSettings, Snapshot, ALL_VEHICLES_KEY, DEFAULT_RADIUS_KM,
    STALE_VEHICLES_KEY,
};
