//! Great-circle distance between coordinate pairs.

use crate::domain::route::Coordinates;

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Haversine distance between two points, in kilometres.
#[must_use]
pub fn great_circle_km(from: Coordinates, to: Coordinates) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Rounds a distance to two decimal places, the precision routes are stored
/// with.
#[must_use]
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}
