use super::{ElevationError, ElevationProvider};
use crate::geo::LatLon;

/// Analytic rolling hills around a centre point, for demos and benchmarks when no
/// DEM tiles are at hand. Offsets are taken in degrees from the centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticTerrain {
    pub center: LatLon,
    pub base_m: f64,
    /// Small hills: amplitude of `sin(5x)·cos(5y)`.
    pub ripple_m: f64,
    /// Large features: amplitude of `sin(2x)·sin(2y)`.
    pub swell_m: f64,
}

impl SyntheticTerrain {
    pub fn new(center: LatLon) -> Self {
        Self {
            center,
            base_m: 200.0,
            ripple_m: 20.0,
            swell_m: 30.0,
        }
    }

    pub fn height_at(&self, loc: LatLon) -> f64 {
        let x = loc.longitude - self.center.longitude;
        let y = loc.latitude - self.center.latitude;
        self.base_m
            + (5.0 * x).sin() * (5.0 * y).cos() * self.ripple_m
            + (2.0 * x).sin() * (2.0 * y).sin() * self.swell_m
    }
}

impl ElevationProvider for SyntheticTerrain {
    fn get_elevation(&self, loc: LatLon) -> Result<f64, ElevationError> {
        Ok(self.height_at(loc))
    }
}
