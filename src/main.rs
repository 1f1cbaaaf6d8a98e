//! Coverage CLI
//!
//! Usage:
//!   wisp_coverage --antennas sites.csv --terrain hgt --terrain-dir ./srtm \
//!                 --output coverage.json --geojson

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

use wisp_coverage::config::EngineConfig;
use wisp_coverage::coverage::CoverageEngine;
use wisp_coverage::geo::LatLon;
use wisp_coverage::io::{load_antennas, save_boundaries_json, save_geojson};
use wisp_coverage::terrain::{
    ElevationProvider, FlatTerrain, GuardedProvider, SyntheticTerrain, TerrainLoader,
    TerrainManager,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TerrainSource {
    /// SRTM .hgt tiles from --terrain-dir
    Hgt,
    /// Constant height from --flat-elevation
    Flat,
    /// Rolling hills centred on the first antenna
    Synthetic,
}

#[derive(Parser, Debug)]
#[command(
    name = "wisp_coverage",
    about = "Estimate terrain-aware coverage boundaries for wireless transmitters"
)]
struct Args {
    /// Antenna list (.json or .csv)
    #[arg(short, long)]
    antennas: PathBuf,

    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TerrainSource::Hgt)]
    terrain: TerrainSource,

    /// Directory holding .hgt tiles
    #[arg(long, default_value = "assets")]
    terrain_dir: PathBuf,

    /// Number of decoded tiles kept in memory
    #[arg(long, default_value_t = 50)]
    tile_cache: usize,

    #[arg(long, default_value_t = 0.0)]
    flat_elevation: f64,

    /// Override the configured bearing count
    #[arg(long)]
    bearings: Option<usize>,

    /// Override the configured worker count
    #[arg(long)]
    workers: Option<usize>,

    /// Output JSON file
    #[arg(short, long, default_value = "coverage.json")]
    output: PathBuf,

    /// Also write GeoJSON polygons next to the output
    #[arg(long)]
    geojson: bool,

    /// Verbose output (RUST_LOG also applies)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    // RUST_LOG directives (e.g. `wisp_coverage::terrain=debug`) refine the default level.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(n) = args.bearings {
        config.bearing_count = n;
    }
    if let Some(n) = args.workers {
        config.workers = n;
    }

    let antennas = load_antennas(&args.antennas)?;
    if antennas.is_empty() {
        bail!("no antennas in {:?}", args.antennas);
    }

    let provider: Arc<dyn ElevationProvider> = match args.terrain {
        TerrainSource::Hgt => {
            info!("Reading terrain tiles from {:?}", args.terrain_dir);
            let manager = TerrainManager::new(TerrainLoader::new(args.terrain_dir.clone()), args.tile_cache);
            Arc::new(GuardedProvider::new(manager, &config.elevation))
        }
        TerrainSource::Flat => Arc::new(FlatTerrain::new(args.flat_elevation)),
        TerrainSource::Synthetic => {
            let first = &antennas[0];
            Arc::new(SyntheticTerrain::new(LatLon::new(first.latitude, first.longitude)))
        }
    };

    let engine = CoverageEngine::new(provider, config)?;
    let entries = engine.compute_batch(&antennas, None);

    let mut boundaries = Vec::with_capacity(entries.len());
    let mut rejected = 0;
    for entry in entries {
        match entry.result {
            Ok(boundary) => boundaries.push(boundary),
            Err(wisp_coverage::CoverageError::ElevationUnavailable { partial }) => {
                warn!("{}: keeping degraded boundary", entry.name);
                boundaries.push(*partial);
            }
            Err(_) => rejected += 1,
        }
    }

    info!("Writing {} boundaries to {:?}", boundaries.len(), args.output);
    save_boundaries_json(&boundaries, &args.output)?;

    if args.geojson {
        let geojson_path = args.output.with_extension("geojson");
        info!("Writing GeoJSON to {:?}", geojson_path);
        save_geojson(&boundaries, &geojson_path)?;
    }

    info!(
        "Done: {} computed, {} degraded, {} rejected",
        boundaries.len(),
        boundaries.iter().filter(|b| b.degraded).count(),
        rejected
    );

    Ok(())
}
