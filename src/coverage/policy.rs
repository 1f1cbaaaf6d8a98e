use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::AntennaClass;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassLimits {
    pub max_range_m: f64,
    pub min_radius_m: f64,
    /// Replaces the engine-wide `max_loss_db` for this class.
    #[serde(default)]
    pub max_loss_db: Option<f64>,
}

impl ClassLimits {
    pub fn new(max_range_m: f64, min_radius_m: f64) -> Self {
        Self {
            max_range_m,
            min_radius_m,
            max_loss_db: None,
        }
    }

    pub fn clamp(&self, distance_m: f64) -> f64 {
        distance_m.clamp(self.min_radius_m, self.max_range_m)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("{class:?}: minimum radius {min_radius_m} must be positive and finite")]
    BadMinimum { class: AntennaClass, min_radius_m: f64 },
    #[error("{class:?}: max range {max_range_m} below minimum radius {min_radius_m}")]
    RangeBelowMinimum {
        class: AntennaClass,
        max_range_m: f64,
        min_radius_m: f64,
    },
    #[error("{class:?}: loss budget override {max_loss_db} is not finite")]
    BadLossBudget { class: AntennaClass, max_loss_db: f64 },
}

/// Search range and floor per antenna class.
///
/// Defaults are planning conventions, not physics: backhaul 50 km, sector 15 km,
/// standard 8 km, 500 m floor for everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTable {
    pub backhaul: ClassLimits,
    pub sector: ClassLimits,
    pub standard: ClassLimits,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            backhaul: ClassLimits::new(50_000.0, 500.0),
            sector: ClassLimits::new(15_000.0, 500.0),
            standard: ClassLimits::new(8_000.0, 500.0),
        }
    }
}

impl PolicyTable {
    pub fn limits(&self, class: AntennaClass) -> ClassLimits {
        match class {
            AntennaClass::Backhaul => self.backhaul,
            AntennaClass::Sector => self.sector,
            AntennaClass::Standard => self.standard,
        }
    }

    pub fn with_limits(mut self, class: AntennaClass, limits: ClassLimits) -> Self {
        match class {
            AntennaClass::Backhaul => self.backhaul = limits,
            AntennaClass::Sector => self.sector = limits,
            AntennaClass::Standard => self.standard = limits,
        }
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        for class in [
            AntennaClass::Backhaul,
            AntennaClass::Sector,
            AntennaClass::Standard,
        ] {
            let l = self.limits(class);
            if !(l.min_radius_m.is_finite() && l.min_radius_m > 0.0) {
                return Err(PolicyError::BadMinimum {
                    class,
                    min_radius_m: l.min_radius_m,
                });
            }
            if !(l.max_range_m.is_finite() && l.max_range_m >= l.min_radius_m) {
                return Err(PolicyError::RangeBelowMinimum {
                    class,
                    max_range_m: l.max_range_m,
                    min_radius_m: l.min_radius_m,
                });
            }
            if let Some(budget) = l.max_loss_db {
                if !budget.is_finite() {
                    return Err(PolicyError::BadLossBudget {
                        class,
                        max_loss_db: budget,
                    });
                }
            }
        }
        Ok(())
    }
}
