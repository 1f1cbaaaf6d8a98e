use serde::{Deserialize, Serialize};

use crate::physics::loss::{diffraction_parameter, fresnel_radius_m};
use crate::physics::profile::ElevationProfile;
use crate::physics::refraction::{RefractionParams, earth_bulge};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearanceScan {
    pub obstructed: bool,
    /// Along-path distance of the first sample that breaks the clearance rule.
    pub first_obstruction_m: Option<f64>,
    /// Minimum of `(LOS - terrain) / fresnel_radius` over interior samples.
    /// Infinite when the path has no interior samples.
    pub clearance_ratio: f64,
    /// Largest knife-edge parameter along the path.
    pub max_v: f64,
}

/// Fresnel-zone clearance test over a sampled terrain profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearanceModel {
    /// Share of the first Fresnel zone that must stay free of terrain.
    pub clearance_fraction: f64,
    /// Effective Earth curvature. `None` treats the ground as flat, so constant
    /// terrain can never intrude.
    pub refraction: Option<RefractionParams>,
}

impl Default for ClearanceModel {
    fn default() -> Self {
        Self {
            clearance_fraction: 0.6,
            refraction: None,
        }
    }
}

impl ClearanceModel {
    /// Scan `profile` for terrain reaching into the Fresnel zone of the ray from
    /// `tx_height_m` above the first sample to `rx_height_m` above the last.
    pub fn scan(
        &self,
        profile: &ElevationProfile,
        tx_height_m: f64,
        rx_height_m: f64,
        frequency_ghz: f64,
    ) -> ClearanceScan {
        let total = profile.length_m;
        let tx_abs = profile.first().terrain_m + tx_height_m;
        let rx_abs = profile.last().terrain_m + rx_height_m;

        let mut scan = ClearanceScan {
            obstructed: false,
            first_obstruction_m: None,
            clearance_ratio: f64::INFINITY,
            max_v: f64::NEG_INFINITY,
        };

        if total <= 0.0 {
            return scan;
        }

        let n = profile.samples.len();
        for sample in &profile.samples[1..n.saturating_sub(1)] {
            let d1 = sample.distance_m;
            let d2 = total - d1;
            if d1 <= 0.0 || d2 <= 0.0 {
                continue;
            }

            let los = tx_abs + (rx_abs - tx_abs) * (d1 / total);
            let terrain = match self.refraction {
                Some(params) => sample.terrain_m + earth_bulge(d1, d2, params),
                None => sample.terrain_m,
            };
            let radius = fresnel_radius_m(d1, d2, frequency_ghz);

            if radius > 0.0 {
                scan.clearance_ratio = scan.clearance_ratio.min((los - terrain) / radius);
            }

            let v = diffraction_parameter(terrain - los, d1, d2, frequency_ghz);
            scan.max_v = scan.max_v.max(v);

            if terrain > los - self.clearance_fraction * radius && !scan.obstructed {
                scan.obstructed = true;
                scan.first_obstruction_m = Some(d1);
            }
        }

        scan
    }
}
