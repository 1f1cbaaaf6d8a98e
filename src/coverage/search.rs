use thiserror::Error;
use tracing::{debug, warn};

use super::policy::ClassLimits;
use super::{BearingResult, CancelToken, SearchState};
use crate::config::{SamplingConfig, SearchConfig};
use crate::geo::destination;
use crate::io::Antenna;
use crate::physics::profile::{ProfileError, profile, samples_for_distance};
use crate::physics::{LimitingReason, PathAssessment, PropagationModel};
use crate::terrain::ElevationProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bearing search cancelled")]
pub struct Cancelled;

enum Probe {
    Scored(PathAssessment, usize),
    Unresolved,
}

/// Everything one bearing's boundary search needs. Shared read-only by all
/// bearings of a single antenna.
pub struct BearingSearch<'a, P: ?Sized> {
    pub provider: &'a P,
    pub antenna: &'a Antenna,
    pub limits: ClassLimits,
    pub budget_db: f64,
    pub model: &'a PropagationModel,
    pub search: SearchConfig,
    pub sampling: SamplingConfig,
    pub cancel: &'a CancelToken,
}

impl<P: ElevationProvider + ?Sized> BearingSearch<'_, P> {
    fn check_cancel(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Score the path from the antenna to the point `distance_m` out on
    /// `bearing_deg`, along with how many of its samples were interpolated.
    pub fn probe_at(
        &self,
        bearing_deg: f64,
        distance_m: f64,
    ) -> Result<(PathAssessment, usize), ProfileError> {
        let origin = self.antenna.location();
        let target = destination(origin, bearing_deg, distance_m);
        let count = samples_for_distance(
            distance_m,
            self.sampling.spacing_m,
            self.sampling.max_samples,
        );
        let path = profile(self.provider, origin, target, count)?;
        let assessment = self.model.assess(
            self.antenna.height_m,
            self.antenna.frequency_ghz,
            self.budget_db,
            &path,
        );
        Ok((assessment, path.interpolated_count()))
    }

    fn probe(&self, bearing_deg: f64, distance_m: f64) -> Probe {
        match self.probe_at(bearing_deg, distance_m) {
            Ok((assessment, interpolated)) => Probe::Scored(assessment, interpolated),
            Err(e) => {
                debug!(
                    "{}: bearing {:.1} at {:.0} m unresolved: {}",
                    self.antenna.name, bearing_deg, distance_m, e
                );
                Probe::Unresolved
            }
        }
    }

    /// Walk SEARCHING to a terminal state for one bearing.
    ///
    /// The bracket `[lo, hi]` always has an acceptable `lo` and an unacceptable
    /// `hi`; the returned distance is `lo` once the bracket is narrower than the
    /// resolution, or the bracket midpoint if the iteration cap hits first.
    pub fn run(&self, bearing_deg: f64) -> Result<BearingResult, Cancelled> {
        let limits = self.limits;
        let mut result = BearingResult {
            bearing_deg,
            distance_m: limits.min_radius_m,
            state: SearchState::Searching,
            reason: LimitingReason::None,
            iterations: 0,
            converged: true,
            interpolated_samples: 0,
            unresolved_probes: 0,
            elevation_failed: false,
        };

        if !self.antenna.covers_bearing(bearing_deg) {
            result.state = SearchState::OffAxis;
            return Ok(result);
        }

        self.check_cancel()?;
        match self.probe(bearing_deg, limits.min_radius_m) {
            Probe::Unresolved => {
                result.state = SearchState::Minimum;
                result.elevation_failed = true;
                return Ok(result);
            }
            Probe::Scored(a, interpolated) => {
                result.interpolated_samples += interpolated;
                if !a.acceptable {
                    result.state = SearchState::Minimum;
                    result.reason = a.reason;
                    return Ok(result);
                }
            }
        }

        let mut lo = limits.min_radius_m;
        let mut hi = limits.max_range_m;

        if hi > lo {
            self.check_cancel()?;
            match self.probe(bearing_deg, hi) {
                Probe::Scored(a, interpolated) => {
                    result.interpolated_samples += interpolated;
                    if a.acceptable {
                        lo = hi;
                    } else {
                        result.reason = a.reason;
                    }
                }
                Probe::Unresolved => result.unresolved_probes += 1,
            }
        }

        if lo >= hi {
            result.state = SearchState::Capped;
            result.reason = LimitingReason::MaxRange;
            result.distance_m = limits.max_range_m;
            return Ok(result);
        }

        while hi - lo > self.search.resolution_m && result.iterations < self.search.max_iterations {
            self.check_cancel()?;
            let mid = 0.5 * (lo + hi);
            match self.probe(bearing_deg, mid) {
                Probe::Scored(a, interpolated) => {
                    result.interpolated_samples += interpolated;
                    if a.acceptable {
                        lo = mid;
                    } else {
                        hi = mid;
                        result.reason = a.reason;
                    }
                }
                Probe::Unresolved => {
                    result.unresolved_probes += 1;
                    hi = mid;
                }
            }
            result.iterations += 1;
        }

        let distance = if hi - lo > self.search.resolution_m {
            warn!(
                "{}: search on bearing {:.1} exhausted {} iterations with a {:.0} m bracket, using midpoint",
                self.antenna.name,
                bearing_deg,
                result.iterations,
                hi - lo
            );
            result.converged = false;
            0.5 * (lo + hi)
        } else {
            lo
        };

        result.state = SearchState::Found;
        result.distance_m = limits.clamp(distance);
        Ok(result)
    }
}
