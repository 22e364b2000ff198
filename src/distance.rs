// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in meters.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.min(1.0).sqrt().asin()
}

/// Latitude and longitude offsets (in degrees) around a position at `lat`,
/// outside of which every point is further than `distance` meters away.
///
/// The longitude offset uses the poleward edge of the latitude band and
/// saturates at 180°. Wrapping around the antimeridian is not considered.
pub fn envelope(lat: f64, distance: f64) -> (f64, f64) {
    let dlat = (distance / EARTH_RADIUS).to_degrees();
    let edge = (lat.abs() + dlat).min(90.0).to_radians();

    let cos = edge.cos();
    let dlon = if cos > 1e-9 {
        (dlat / cos).min(180.0)
    } else {
        180.0
    };

    (dlat, dlon)
}
