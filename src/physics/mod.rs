//! Path scoring: free-space loss plus Fresnel clearance and knife-edge
//! diffraction over a sampled terrain profile.
//!
//! This physical model is the only one the engine uses. Empirical radius scaling
//! by height and power ratios is not applied anywhere; power enters only through
//! the loss budget.

pub mod loss;
pub mod los;
pub mod profile;
pub mod refraction;

use serde::{Deserialize, Serialize};

use self::loss::{DiffractionCurve, MIN_PATH_M, free_space_path_loss_db};
use self::los::ClearanceModel;
use self::profile::ElevationProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingReason {
    None,
    Obstructed,
    LossExceeded,
    MaxRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathAssessment {
    pub distance_m: f64,
    pub free_space_loss_db: f64,
    pub fresnel_clearance_ratio: f64,
    pub diffraction_loss_db: f64,
    pub total_loss_db: f64,
    pub budget_db: f64,
    pub obstructed: bool,
    pub obstruction_m: Option<f64>,
    pub acceptable: bool,
    pub reason: LimitingReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationModel {
    /// Reference height of the receiving antenna above local terrain.
    pub receiver_height_m: f64,
    pub clearance: ClearanceModel,
    pub diffraction: DiffractionCurve,
}

impl Default for PropagationModel {
    fn default() -> Self {
        Self {
            receiver_height_m: 5.0,
            clearance: ClearanceModel::default(),
            diffraction: DiffractionCurve::default(),
        }
    }
}

impl PropagationModel {
    /// Score one path against `budget_db` of allowed total loss.
    pub fn assess(
        &self,
        antenna_height_m: f64,
        frequency_ghz: f64,
        budget_db: f64,
        profile: &ElevationProfile,
    ) -> PathAssessment {
        let distance_m = profile.length_m;
        if distance_m <= MIN_PATH_M {
            return PathAssessment {
                distance_m,
                free_space_loss_db: 0.0,
                fresnel_clearance_ratio: f64::INFINITY,
                diffraction_loss_db: 0.0,
                total_loss_db: 0.0,
                budget_db,
                obstructed: false,
                obstruction_m: None,
                acceptable: true,
                reason: LimitingReason::None,
            };
        }

        let fspl = free_space_path_loss_db(distance_m, frequency_ghz);
        let scan = self.clearance.scan(
            profile,
            antenna_height_m,
            self.receiver_height_m,
            frequency_ghz,
        );
        let diffraction = if scan.obstructed {
            self.diffraction.loss_db(scan.max_v)
        } else {
            0.0
        };
        let total = fspl + diffraction;
        let acceptable = total <= budget_db;

        let reason = if acceptable {
            LimitingReason::None
        } else if fspl <= budget_db {
            LimitingReason::Obstructed
        } else {
            LimitingReason::LossExceeded
        };

        PathAssessment {
            distance_m,
            free_space_loss_db: fspl,
            fresnel_clearance_ratio: scan.clearance_ratio,
            diffraction_loss_db: diffraction,
            total_loss_db: total,
            budget_db,
            obstructed: scan.obstructed,
            obstruction_m: scan.first_obstruction_m,
            acceptable,
            reason,
        }
    }
}
