use serde::{Deserialize, Serialize};

/// Mean Earth radius (m).
pub const EARTH_RADIUS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Wrap a bearing into [0, 360).
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let b = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if b >= 360.0 { 0.0 } else { b }
}

/// Smallest angle between two bearings, in [0, 180].
pub fn angular_difference(a_deg: f64, b_deg: f64) -> f64 {
    let d = normalize_bearing(a_deg - b_deg);
    if d > 180.0 { 360.0 - d } else { d }
}

fn normalize_longitude(lon_deg: f64) -> f64 {
    (lon_deg + 540.0).rem_euclid(360.0) - 180.0
}

/// Haversine great-circle distance in meters.
pub fn distance(p1: LatLon, p2: LatLon) -> f64 {
    calculate_geodesic(p1, p2).0
}

/// Initial great-circle bearing from `p1` towards `p2`, in [0, 360).
pub fn initial_bearing(p1: LatLon, p2: LatLon) -> f64 {
    calculate_geodesic(p1, p2).1
}

/// Distance (m) and initial bearing (deg) between two points on the sphere.
pub fn calculate_geodesic(p1: LatLon, p2: LatLon) -> (f64, f64) {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlon = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    let dist = EARTH_RADIUS * c;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing = normalize_bearing(y.atan2(x).to_degrees());

    (dist, bearing)
}

/// Point reached by travelling `distance_m` from `origin` along the great circle
/// leaving at `bearing_deg`.
pub fn destination(origin: LatLon, bearing_deg: f64, distance_m: f64) -> LatLon {
    let delta = distance_m / EARTH_RADIUS;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    LatLon {
        latitude: lat2.to_degrees(),
        longitude: normalize_longitude(lon2.to_degrees()),
    }
}
