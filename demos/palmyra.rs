//! Small WISP network around Palmyra, Indiana, on synthetic rolling hills.
//!
//! cargo run --example palmyra

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use wisp_coverage::config::EngineConfig;
use wisp_coverage::coverage::CoverageEngine;
use wisp_coverage::geo::LatLon;
use wisp_coverage::io::{Antenna, AntennaClass, save_geojson};
use wisp_coverage::terrain::SyntheticTerrain;

fn network() -> Vec<Antenna> {
    let palmyra = LatLon::new(38.3864, -86.1091);
    let new_salisbury = LatLon::new(38.3147, -86.1556);
    let corydon = LatLon::new(38.2120, -86.1225);

    let mut sites = vec![
        Antenna::new("Palmyra-Hub-Omni", palmyra, 45.0, 1000.0, 2.4, AntennaClass::Standard),
        Antenna::new("NewSalisbury-Hub-Omni", new_salisbury, 40.0, 1000.0, 2.4, AntennaClass::Standard),
        Antenna::new("Corydon-Hub-Omni", corydon, 35.0, 1000.0, 2.4, AntennaClass::Standard),
    ];

    for (suffix, azimuth) in [("North", 0.0), ("East", 90.0), ("South", 180.0), ("West", 270.0)] {
        sites.push(
            Antenna::new(format!("Palmyra-Sector-{suffix}"), palmyra, 43.0, 1000.0, 5.8, AntennaClass::Sector)
                .with_beam(azimuth, 90.0),
        );
    }
    for (suffix, azimuth) in [("NE", 45.0), ("SE", 135.0)] {
        sites.push(
            Antenna::new(format!("NewSalisbury-Sector-{suffix}"), new_salisbury, 38.0, 1000.0, 5.8, AntennaClass::Sector)
                .with_beam(azimuth, 90.0),
        );
    }

    sites.push(
        Antenna::new("Palmyra-Backhaul-South", palmyra, 45.0, 1500.0, 5.8, AntennaClass::Backhaul)
            .with_beam(170.0, 5.0),
    );
    sites.push(
        Antenna::new("NewSalisbury-Backhaul-North", new_salisbury, 42.0, 1500.0, 5.8, AntennaClass::Backhaul)
            .with_beam(350.0, 5.0),
    );

    sites
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let terrain = SyntheticTerrain::new(LatLon::new(38.4064, -86.1091));
    let engine = CoverageEngine::new(Arc::new(terrain), EngineConfig::default())?;

    let antennas = network();
    let mut boundaries = Vec::new();
    for entry in engine.compute_batch(&antennas, None) {
        match entry.result {
            Ok(boundary) => {
                info!(
                    "{:<28} {:>6.0} - {:>6.0} m{}",
                    boundary.antenna,
                    boundary.min_distance(),
                    boundary.max_distance(),
                    if boundary.degraded { " (degraded)" } else { "" }
                );
                boundaries.push(boundary);
            }
            Err(e) => warn!("{}: {}", entry.name, e),
        }
    }

    let out = Path::new("output");
    std::fs::create_dir_all(out)?;
    let path = out.join("palmyra.geojson");
    save_geojson(&boundaries, &path)?;
    info!("Wrote {} boundaries to {:?}", boundaries.len(), path);

    Ok(())
}
