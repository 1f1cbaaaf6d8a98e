use serde::{Deserialize, Serialize};

use crate::geo::EARTH_RADIUS;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefractionParams {
    pub k_factor: f64,
}

impl Default for RefractionParams {
    fn default() -> Self {
        Self { k_factor: 4.0 / 3.0 }
    }
}

pub fn effective_earth_radius(params: RefractionParams) -> f64 {
    EARTH_RADIUS * params.k_factor
}

/// Height the ground rises into a straight ray at a point `d1` from one end and
/// `d2` from the other.
pub fn earth_bulge(d1_m: f64, d2_m: f64, params: RefractionParams) -> f64 {
    (d1_m * d2_m) / (2.0 * effective_earth_radius(params))
}
