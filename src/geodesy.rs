use serde::{Deserialize, Serialize};

use crate::types::CompassDelta;

/// Equatorial radius. The earth is treated as a sphere; no ellipsoid correction.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> GeoCoordinate {
        GeoCoordinate {
            latitude,
            longitude,
        }
    }
}

/// Spherical forward geodesic: walks `north`/`east` meters from `origin`.
pub fn destination(origin: &GeoCoordinate, north: f64, east: f64) -> GeoCoordinate {
    let distance = north.hypot(east);
    let bearing = east.atan2(north);
    let d = distance / EARTH_RADIUS_METERS;

    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

    GeoCoordinate::new(lat2.to_degrees(), lon2.to_degrees())
}

pub fn offset(origin: &GeoCoordinate, delta: &CompassDelta) -> GeoCoordinate {
    destination(origin, delta.north, delta.east)
}

/// Great-circle distance in meters on the same sphere used by [`destination`].
pub fn haversine_distance(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in radians, 0 = north, pi/2 = east.
pub fn initial_bearing(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x)
}

/// Inverse of [`destination`]: the north/east offset that leads from `origin` to `target`.
pub fn delta_between(origin: &GeoCoordinate, target: &GeoCoordinate) -> CompassDelta {
    let distance = haversine_distance(origin, target);
    let bearing = initial_bearing(origin, target);
    CompassDelta::new(distance * bearing.cos(), distance * bearing.sin())
}
