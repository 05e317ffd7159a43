//! Distance Module
//!
//! Haversine distance guarded by a cheap rectangular pre-check.

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Half-width of the pre-check box in degrees (~11 km of latitude).
pub const BOUNDING_BOX_DEGREES: f64 = 0.1;

/// Great-circle distance in kilometres between two points in decimal degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance, or `f64::INFINITY` when the points are more than
/// [`BOUNDING_BOX_DEGREES`] apart on either axis.
///
/// The box caps the effective search radius at roughly 11 km north-south
/// and less east-west; larger radii return the same set.
pub fn bounded_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if (lat2 - lat1).abs() > BOUNDING_BOX_DEGREES || (lon2 - lon1).abs() > BOUNDING_BOX_DEGREES {
        return f64::INFINITY;
    }
    haversine_km(lat1, lon1, lat2, lon2)
}
