use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coverage::policy::{PolicyError, PolicyTable};
use crate::physics::PropagationModel;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("bearing count must be at least 1")]
    NoBearings,
    #[error("search resolution {0} m must be positive")]
    BadResolution(f64),
    #[error("sample spacing {0} m must be positive")]
    BadSpacing(f64),
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("clearance fraction {0} must be finite and non-negative")]
    BadClearance(f64),
    #[error("receiver height {0} m must be finite and non-negative")]
    BadReceiverHeight(f64),
    #[error("loss budget must be finite with a positive reference power")]
    BadBudget,
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Allowed total path loss, scaled by transmit power relative to a reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkBudget {
    /// Loss (dB) a transmitter at `reference_power_w` may absorb.
    pub max_loss_db: f64,
    pub reference_power_w: f64,
}

impl Default for LinkBudget {
    fn default() -> Self {
        Self {
            max_loss_db: 120.0,
            reference_power_w: 1000.0,
        }
    }
}

impl LinkBudget {
    /// `max_loss_db + 10·log10(power / reference)`, with `max_loss_db` optionally
    /// replaced by a class override.
    pub fn allowed_loss_db(&self, power_w: f64, class_override: Option<f64>) -> f64 {
        class_override.unwrap_or(self.max_loss_db)
            + 10.0 * (power_w / self.reference_power_w).log10()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Bisection stops once the bracket is this narrow.
    pub resolution_m: f64,
    pub max_iterations: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            resolution_m: 50.0,
            max_iterations: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub spacing_m: f64,
    pub max_samples: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            spacing_m: 100.0,
            max_samples: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationGuardConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for ElevationGuardConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            retries: 1,
            backoff_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub link_budget: LinkBudget,
    pub bearing_count: usize,
    pub search: SearchConfig,
    pub sampling: SamplingConfig,
    pub propagation: PropagationModel,
    pub policy: PolicyTable,
    /// Upper bound on bearings searched at once.
    pub workers: usize,
    pub elevation: ElevationGuardConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            link_budget: LinkBudget::default(),
            bearing_count: 72,
            search: SearchConfig::default(),
            sampling: SamplingConfig::default(),
            propagation: PropagationModel::default(),
            policy: PolicyTable::default(),
            workers: 4,
            elevation: ElevationGuardConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse engine config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bearing_count == 0 {
            return Err(ConfigError::NoBearings);
        }
        if !(self.search.resolution_m > 0.0) {
            return Err(ConfigError::BadResolution(self.search.resolution_m));
        }
        if !(self.sampling.spacing_m > 0.0) {
            return Err(ConfigError::BadSpacing(self.sampling.spacing_m));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        let fraction = self.propagation.clearance.clearance_fraction;
        if !(fraction.is_finite() && fraction >= 0.0) {
            return Err(ConfigError::BadClearance(fraction));
        }
        let rx = self.propagation.receiver_height_m;
        if !(rx.is_finite() && rx >= 0.0) {
            return Err(ConfigError::BadReceiverHeight(rx));
        }
        let budget = self.link_budget;
        if !(budget.max_loss_db.is_finite()
            && budget.reference_power_w.is_finite()
            && budget.reference_power_w > 0.0)
        {
            return Err(ConfigError::BadBudget);
        }
        self.policy.validate()?;
        Ok(())
    }
}
