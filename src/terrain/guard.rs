use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::{ElevationError, ElevationProvider};
use crate::config::ElevationGuardConfig;
use crate::geo::LatLon;

/// Wraps a provider with a per-call latency bound and retry of transient failures.
///
/// Each lookup runs on its own short-lived thread and the caller waits at most
/// `timeout` for the answer. A lookup that overruns is reported as
/// [`ElevationError::Timeout`] and left to finish in the background; its result
/// is dropped.
pub struct GuardedProvider<P> {
    inner: Arc<P>,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl<P: ElevationProvider + 'static> GuardedProvider<P> {
    pub fn new(inner: P, config: &ElevationGuardConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout: Duration::from_millis(config.timeout_ms),
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn attempt(&self, loc: LatLon) -> Result<f64, ElevationError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("elevation-lookup".into())
            .spawn(move || {
                // The receiver is gone once the caller stopped waiting.
                let _ = tx.send(inner.get_elevation(loc));
            })
            .map_err(|e| ElevationError::ProviderUnavailable(format!("lookup thread: {}", e)))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(ElevationError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ElevationError::ProviderUnavailable(
                "elevation lookup panicked".into(),
            )),
        }
    }
}

impl<P: ElevationProvider + 'static> ElevationProvider for GuardedProvider<P> {
    fn get_elevation(&self, loc: LatLon) -> Result<f64, ElevationError> {
        let mut attempt = 0;
        loop {
            match self.attempt(loc) {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    let wait = self.backoff * 2u32.saturating_pow(attempt);
                    debug!(
                        "Elevation lookup at {:.5},{:.5} failed ({}), retrying in {:?}",
                        loc.latitude, loc.longitude, e, wait
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 0 {
                        warn!(
                            "Elevation lookup at {:.5},{:.5} failed after {} retries: {}",
                            loc.latitude, loc.longitude, attempt, e
                        );
                    }
                    return Err(e);
                }
                ok => return ok,
            }
        }
    }
}
