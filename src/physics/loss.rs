use serde::{Deserialize, Serialize};

pub const C_LIGHT: f64 = 299_792_458.0;

/// Free-space constant for distance in km and frequency in MHz.
pub const FSPL_CONSTANT_KM_MHZ: f64 = 32.44;

/// Paths shorter than this are treated as zero length.
pub const MIN_PATH_M: f64 = 1e-3;

pub fn wavelength_m(frequency_ghz: f64) -> f64 {
    C_LIGHT / (frequency_ghz * 1e9)
}

/// Free-space path loss in dB: `20·log10(d_km) + 20·log10(f_MHz) + 32.44`.
pub fn free_space_path_loss_db(distance_m: f64, frequency_ghz: f64) -> f64 {
    if distance_m <= MIN_PATH_M {
        return 0.0;
    }
    let d_km = distance_m / 1000.0;
    let f_mhz = frequency_ghz * 1000.0;
    (20.0 * d_km.log10() + 20.0 * f_mhz.log10() + FSPL_CONSTANT_KM_MHZ).max(0.0)
}

/// Distance (m) at which free-space loss alone reaches `loss_db`.
pub fn free_space_range_m(loss_db: f64, frequency_ghz: f64) -> f64 {
    let f_mhz = frequency_ghz * 1000.0;
    let d_km = 10f64.powf((loss_db - FSPL_CONSTANT_KM_MHZ - 20.0 * f_mhz.log10()) / 20.0);
    d_km * 1000.0
}

/// First Fresnel zone radius (m) at a point `d1` and `d2` meters from the ends.
pub fn fresnel_radius_m(d1_m: f64, d2_m: f64, frequency_ghz: f64) -> f64 {
    let total = d1_m + d2_m;
    if d1_m <= 0.0 || d2_m <= 0.0 || total <= 0.0 {
        return 0.0;
    }
    (wavelength_m(frequency_ghz) * d1_m * d2_m / total).sqrt()
}

/// Knife-edge parameter `v = h·sqrt(2(d1+d2)/(λ·d1·d2))`, with `h` the height of
/// the edge above the direct ray (negative below it).
pub fn diffraction_parameter(h_m: f64, d1_m: f64, d2_m: f64, frequency_ghz: f64) -> f64 {
    if d1_m <= 0.0 || d2_m <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let lambda = wavelength_m(frequency_ghz);
    h_m * (2.0 * (d1_m + d2_m) / (lambda * d1_m * d2_m)).sqrt()
}

/// ITU-R P.526 single knife-edge approximation:
/// `J(v) = offset + 20·log10(sqrt((v − shift)² + 1) + v − shift)` above `cutoff_v`,
/// 0 dB at or below it.
///
/// With the default parameters `J(0) ≈ 6.03 dB`, `J(1) ≈ 13.93 dB` and
/// `J(2.4) ≈ 20.5 dB`; the curve reaches 0 dB at the cutoff. `J(1)` sits below
/// the 16 dB often quoted for single-edge rules of thumb; raise `offset_db` for a
/// more pessimistic curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffractionCurve {
    pub offset_db: f64,
    pub v_shift: f64,
    pub cutoff_v: f64,
}

impl Default for DiffractionCurve {
    fn default() -> Self {
        Self {
            offset_db: 6.9,
            v_shift: 0.1,
            cutoff_v: -0.78,
        }
    }
}

impl DiffractionCurve {
    pub fn loss_db(&self, v: f64) -> f64 {
        if !(v > self.cutoff_v) {
            return 0.0;
        }
        let x = v - self.v_shift;
        (self.offset_db + 20.0 * ((x * x + 1.0).sqrt() + x).log10()).max(0.0)
    }
}

pub fn watts_to_dbm(watts: f64) -> f64 {
    10.0 * (watts * 1000.0).log10()
}

pub fn dbm_to_watts(dbm: f64) -> f64 {
    10f64.powf((dbm - 30.0) / 10.0)
}
