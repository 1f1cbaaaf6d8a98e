//! Coverage solver: one bounded boundary search per compass bearing, fanned out
//! over a worker pool and joined back into a single [`CoverageBoundary`].

pub mod policy;
pub mod search;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::geo::{LatLon, destination};
use crate::io::{Antenna, AntennaClass, AntennaError, check_unique_names};
use crate::physics::LimitingReason;
use crate::terrain::ElevationProvider;

use self::policy::PolicyTable;
use self::search::BearingSearch;

/// Shared flag that abandons every in-flight bearing of a computation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Searching,
    /// Acceptable/unacceptable transition located inside the class range.
    Found,
    /// Still acceptable at the class max range.
    Capped,
    /// Unacceptable (or unknown) even at the minimum radius.
    Minimum,
    /// Outside a directional antenna's beam; minimum radius, no search.
    OffAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BearingResult {
    pub bearing_deg: f64,
    pub distance_m: f64,
    pub state: SearchState,
    pub reason: LimitingReason,
    pub iterations: u32,
    pub converged: bool,
    pub interpolated_samples: usize,
    pub unresolved_probes: u32,
    /// No elevation could be resolved even at the minimum radius.
    pub elevation_failed: bool,
}

impl BearingResult {
    pub fn is_degraded(&self) -> bool {
        self.elevation_failed || self.unresolved_probes > 0 || self.interpolated_samples > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageBoundary {
    pub antenna: String,
    pub origin: LatLon,
    pub class: AntennaClass,
    /// One entry per bearing, in increasing bearing order.
    pub points: Vec<BearingResult>,
    /// Some bearing relied on interpolated or missing elevation data.
    pub degraded: bool,
}

impl CoverageBoundary {
    /// `(bearing_deg, distance_m)` pairs.
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.bearing_deg, p.distance_m))
            .collect()
    }

    pub fn min_distance(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.distance_m)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn max_distance(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.distance_m)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Boundary vertices on the ground, closed by repeating the first vertex.
    pub fn to_polygon(&self) -> Vec<LatLon> {
        let mut ring = self
            .points
            .iter()
            .map(|p| destination(self.origin, p.bearing_deg, p.distance_m))
            .collect_vec();
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        ring
    }
}

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("invalid antenna {name:?}: {source}")]
    InvalidAntenna {
        name: String,
        #[source]
        source: AntennaError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("no elevation data for any searched bearing of {:?}", .partial.antenna)]
    ElevationUnavailable { partial: Box<CoverageBoundary> },
    #[error("coverage computation cancelled")]
    Cancelled,
    #[error("failed to start coverage workers: {0}")]
    WorkerPool(#[from] ThreadPoolBuildError),
}

#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub result: Result<CoverageBoundary, CoverageError>,
}

pub struct CoverageEngine<P: ?Sized> {
    provider: Arc<P>,
    config: EngineConfig,
    pool: ThreadPool,
}

impl<P: ElevationProvider + ?Sized> CoverageEngine<P> {
    pub fn new(provider: Arc<P>, config: EngineConfig) -> Result<Self, CoverageError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("coverage-{}", i))
            .build()?;
        Ok(Self {
            provider,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Evenly spaced bearings starting at north.
    pub fn bearings(&self) -> Vec<f64> {
        let n = self.config.bearing_count;
        (0..n).map(|i| i as f64 * 360.0 / n as f64).collect()
    }

    pub fn compute_coverage(
        &self,
        antenna: &Antenna,
        policy: Option<&PolicyTable>,
    ) -> Result<CoverageBoundary, CoverageError> {
        self.compute_coverage_cancellable(antenna, policy, &CancelToken::new())
    }

    /// Solve every bearing for `antenna`. `policy` replaces the configured class
    /// table for this call only.
    ///
    /// Returns the whole boundary or nothing: once `cancel` fires, in-flight
    /// bearings stop at their next probe and the call yields `Cancelled`.
    pub fn compute_coverage_cancellable(
        &self,
        antenna: &Antenna,
        policy: Option<&PolicyTable>,
        cancel: &CancelToken,
    ) -> Result<CoverageBoundary, CoverageError> {
        antenna
            .validate()
            .map_err(|source| CoverageError::InvalidAntenna {
                name: antenna.name.clone(),
                source,
            })?;

        let policy = match policy {
            Some(table) => {
                table.validate().map_err(ConfigError::from)?;
                table
            }
            None => &self.config.policy,
        };
        let limits = policy.limits(antenna.class);
        let budget_db = self
            .config
            .link_budget
            .allowed_loss_db(antenna.power_w, limits.max_loss_db);

        info!(
            "Computing coverage for {} ({:?}, {:.1} GHz, {:.0} W): budget {:.1} dB, range {:.0}-{:.0} m",
            antenna.name,
            antenna.class,
            antenna.frequency_ghz,
            antenna.power_w,
            budget_db,
            limits.min_radius_m,
            limits.max_range_m
        );

        let search = BearingSearch {
            provider: &*self.provider,
            antenna,
            limits,
            budget_db,
            model: &self.config.propagation,
            search: self.config.search,
            sampling: self.config.sampling,
            cancel,
        };

        let bearings = self.bearings();
        let points = self
            .pool
            .install(|| {
                bearings
                    .par_iter()
                    .map(|&bearing| search.run(bearing))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|_| CoverageError::Cancelled)?;

        if cancel.is_cancelled() {
            return Err(CoverageError::Cancelled);
        }

        for p in &points {
            debug!(
                "{}: bearing {:>5.1} -> {:>7.0} m ({:?}, {:?})",
                antenna.name, p.bearing_deg, p.distance_m, p.state, p.reason
            );
        }

        let degraded = points.iter().any(BearingResult::is_degraded);
        let boundary = CoverageBoundary {
            antenna: antenna.name.clone(),
            origin: antenna.location(),
            class: antenna.class,
            points,
            degraded,
        };

        let searched = boundary
            .points
            .iter()
            .filter(|p| p.state != SearchState::OffAxis)
            .collect_vec();
        if !searched.is_empty() && searched.iter().all(|p| p.elevation_failed) {
            warn!("{}: elevation unavailable on every bearing", antenna.name);
            return Err(CoverageError::ElevationUnavailable {
                partial: Box::new(boundary),
            });
        }

        if degraded {
            let failed = searched.iter().filter(|p| p.is_degraded()).count();
            warn!(
                "{}: {} of {} bearings used incomplete elevation data",
                antenna.name,
                failed,
                searched.len()
            );
        }

        info!(
            "{}: coverage {:.0}-{:.0} m over {} bearings",
            antenna.name,
            boundary.min_distance(),
            boundary.max_distance(),
            boundary.points.len()
        );

        Ok(boundary)
    }

    /// Solve a list of antennas. A rejected antenna only fails its own entry.
    pub fn compute_batch(
        &self,
        antennas: &[Antenna],
        policy: Option<&PolicyTable>,
    ) -> Vec<BatchEntry> {
        let unique = check_unique_names(antennas);
        antennas
            .iter()
            .zip(unique)
            .map(|(antenna, unique)| {
                let result = match unique {
                    Ok(()) => self.compute_coverage(antenna, policy),
                    Err(source) => Err(CoverageError::InvalidAntenna {
                        name: antenna.name.clone(),
                        source,
                    }),
                };
                if let Err(e) = &result {
                    warn!("Skipping {}: {}", antenna.name, e);
                }
                BatchEntry {
                    name: antenna.name.clone(),
                    result,
                }
            })
            .collect()
    }
}
