//! Geo Module
//!
//! Great-circle distance with a bounding-box short circuit.

mod distance;

pub use distance::{bounded_distance_km, haversine_km, BOUNDING_BOX_DEGREES, EARTH_RADIUS_KM};
