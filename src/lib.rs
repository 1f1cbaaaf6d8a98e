pub mod geo;
pub mod io;
pub mod terrain;
pub mod physics;
pub mod coverage;
pub mod config;
pub mod cache;


pub use config::EngineConfig;
pub use coverage::{CancelToken, CoverageBoundary, CoverageEngine, CoverageError};
pub use io::{Antenna, AntennaClass};
pub use terrain::{ElevationError, ElevationProvider};
