use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::geo::{LatLon, calculate_geodesic, destination};
use crate::terrain::{ElevationError, ElevationProvider};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationSample {
    pub distance_m: f64,
    pub terrain_m: f64,
    pub location: LatLon,
    /// Height was borrowed from the nearest resolved neighbour.
    pub interpolated: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("a profile needs at least two samples, got {0}")]
    TooFewSamples(usize),
    #[error("no elevation resolved along the {length_m:.0} m path: {source}")]
    Unresolved {
        length_m: f64,
        #[source]
        source: ElevationError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationProfile {
    pub samples: Vec<ElevationSample>,
    pub length_m: f64,
}

impl ElevationProfile {
    pub fn first(&self) -> &ElevationSample {
        &self.samples[0]
    }

    pub fn last(&self) -> &ElevationSample {
        &self.samples[self.samples.len() - 1]
    }

    pub fn interpolated_count(&self) -> usize {
        self.samples.iter().filter(|s| s.interpolated).count()
    }

    pub fn is_degraded(&self) -> bool {
        self.samples.iter().any(|s| s.interpolated)
    }
}

/// Sample count that keeps spacing at or under `spacing_m`, both endpoints
/// included, never fewer than 2 nor more than `max_samples`.
pub fn samples_for_distance(length_m: f64, spacing_m: f64, max_samples: usize) -> usize {
    let intervals = (length_m / spacing_m).ceil();
    let wanted = if intervals.is_finite() && intervals > 0.0 {
        intervals as usize + 1
    } else {
        2
    };
    wanted.clamp(2, max_samples.max(2))
}

/// Terrain heights at `sample_count` evenly spaced points along the great circle
/// from `origin` to `dest`, both included.
///
/// A failed lookup takes the height of the nearest resolved sample (the one closer
/// to the origin on a tie) and is marked interpolated. The origin is shared by
/// every path out of a site, so a profile where nothing past it resolves is
/// reported as [`ProfileError::Unresolved`].
pub fn profile<P: ElevationProvider + ?Sized>(
    provider: &P,
    origin: LatLon,
    dest: LatLon,
    sample_count: usize,
) -> Result<ElevationProfile, ProfileError> {
    if sample_count < 2 {
        return Err(ProfileError::TooFewSamples(sample_count));
    }

    let (length_m, bearing) = calculate_geodesic(origin, dest);
    let last = sample_count - 1;

    let points = (0..sample_count)
        .map(|i| {
            let distance_m = length_m * i as f64 / last as f64;
            let location = match i {
                0 => origin,
                i if i == last => dest,
                _ => destination(origin, bearing, distance_m),
            };
            (distance_m, location)
        })
        .collect_vec();

    let lookups = points
        .iter()
        .map(|(_, loc)| provider.get_elevation(*loc))
        .collect_vec();

    let resolved = lookups
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.as_ref().ok().map(|h| (i, *h)))
        .collect_vec();
    if !resolved.iter().any(|&(i, _)| i > 0) {
        let source = lookups
            .into_iter()
            .rev()
            .find_map(Result::err)
            .unwrap_or(ElevationError::ProviderUnavailable("no samples".into()));
        return Err(ProfileError::Unresolved { length_m, source });
    }

    let samples = points
        .iter()
        .zip(&lookups)
        .enumerate()
        .map(|(i, (&(distance_m, location), lookup))| {
            let (terrain_m, interpolated) = match lookup {
                Ok(h) => (*h, false),
                Err(_) => (nearest_resolved(&resolved, i), true),
            };
            ElevationSample {
                distance_m,
                terrain_m,
                location,
                interpolated,
            }
        })
        .collect_vec();

    Ok(ElevationProfile { samples, length_m })
}

/// Height of the resolved sample closest to index `i`. `resolved` is sorted by
/// index and non-empty.
fn nearest_resolved(resolved: &[(usize, f64)], i: usize) -> f64 {
    let pos = resolved.partition_point(|&(j, _)| j < i);
    let after = resolved.get(pos);
    let before = pos.checked_sub(1).and_then(|p| resolved.get(p));
    match (before, after) {
        (Some(&(b, hb)), Some(&(a, ha))) => {
            if i - b <= a - i {
                hb
            } else {
                ha
            }
        }
        (Some(&(_, h)), None) | (None, Some(&(_, h))) => h,
        (None, None) => 0.0,
    }
}
