//! Geographic coordinates and great-circle helpers.
//!
//! Everything in the crate that describes a place on the map (route
//! geometry, the bus position in a published snapshot) uses [`Coordinate`].

mod types;

pub use types::{CoordError, Coordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Linear interpolation between two coordinates.
///
/// `t` is clamped to `0.0..=1.0`. Good enough for the short hops of a
/// simulated route; not a geodesic.
pub fn interpolate(a: &Coordinate, b: &Coordinate, t: f64) -> Coordinate {
    let t = t.clamp(0.0, 1.0);
    Coordinate {
        latitude: a.latitude + (b.latitude - a.latitude) * t,
        longitude: a.longitude + (b.longitude - a.longitude) * t,
    }
}

#[cfg(test)]
mod tests;
