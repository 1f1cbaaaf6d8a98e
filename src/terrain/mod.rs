use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheStats, TileCache, TileKey};
use crate::geo::LatLon;

pub mod guard;
pub mod synthetic;

pub use guard::GuardedProvider;
pub use synthetic::SyntheticTerrain;

pub const SRTM3_SIZE: usize = 1201;
pub const SRTM1_SIZE: usize = 3601;

/// SRTM marker for cells without data.
pub const SRTM_VOID: i16 = -32768;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElevationError {
    #[error("elevation provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("terrain tile {lat},{lon} missing")]
    TileMissing { lat: i32, lon: i32 },
    #[error("elevation lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl ElevationError {
    /// Failures worth one more attempt at the provider boundary.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::Timeout(_))
    }
}

/// Terrain height source. Heights are meters above mean sea level.
pub trait ElevationProvider: Send + Sync {
    fn get_elevation(&self, loc: LatLon) -> Result<f64, ElevationError>;
}

impl<T: ElevationProvider + ?Sized> ElevationProvider for Arc<T> {
    fn get_elevation(&self, loc: LatLon) -> Result<f64, ElevationError> {
        (**self).get_elevation(loc)
    }
}

impl<T: ElevationProvider + ?Sized> ElevationProvider for &T {
    fn get_elevation(&self, loc: LatLon) -> Result<f64, ElevationError> {
        (**self).get_elevation(loc)
    }
}

/// Same height everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub elevation_m: f64,
}

impl FlatTerrain {
    pub fn new(elevation_m: f64) -> Self {
        Self { elevation_m }
    }
}

impl ElevationProvider for FlatTerrain {
    fn get_elevation(&self, _loc: LatLon) -> Result<f64, ElevationError> {
        Ok(self.elevation_m)
    }
}

#[derive(Debug, Clone)]
pub struct TerrainTile {
    pub latitude: i32,
    pub longitude: i32,
    pub size: usize,
    pub data: Vec<i16>, // Row-major, north row first
}

impl TerrainTile {
    /// Bilinear height at local coordinates in [0, 1], (0,0) being the NW corner.
    /// Void corners are left out of the blend; `None` when all four are void.
    pub fn sample(&self, u: f64, v: f64) -> Option<f64> {
        let max_idx = (self.size - 1) as f64;
        let x = u.clamp(0.0, 1.0) * max_idx;
        let y = v.clamp(0.0, 1.0) * max_idx;

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.size - 1);
        let y1 = (y0 + 1).min(self.size - 1);

        let tx = x - x0 as f64;
        let ty = y - y0 as f64;

        let corners = [
            (self.get_height(x0, y0), (1.0 - tx) * (1.0 - ty)),
            (self.get_height(x1, y0), tx * (1.0 - ty)),
            (self.get_height(x0, y1), (1.0 - tx) * ty),
            (self.get_height(x1, y1), tx * ty),
        ];

        let (sum, weight) = corners
            .iter()
            .filter(|(h, _)| *h != SRTM_VOID)
            .fold((0.0, 0.0), |(s, w), &(h, wt)| (s + h as f64 * wt, w + wt));

        if corners.iter().all(|(h, _)| *h == SRTM_VOID) {
            return None;
        }
        if weight <= f64::EPSILON {
            // Sample sits exactly on a void corner; fall back to the valid corners.
            let valid: Vec<f64> = corners
                .iter()
                .filter(|(h, _)| *h != SRTM_VOID)
                .map(|(h, _)| *h as f64)
                .collect();
            return Some(valid.iter().sum::<f64>() / valid.len() as f64);
        }
        Some(sum / weight)
    }

    #[inline(always)]
    pub fn get_height(&self, x: usize, y: usize) -> i16 {
        self.data[y * self.size + x]
    }
}

/// Reads `.hgt` tiles (e.g. `N38W087.hgt`) from a directory.
pub struct TerrainLoader {
    pub assets_path: PathBuf,
}

impl TerrainLoader {
    pub fn new(assets_path: PathBuf) -> Self {
        Self { assets_path }
    }

    pub fn tile_filename(lat: i32, lon: i32) -> String {
        format!(
            "{}{:02}{}{:03}.hgt",
            if lat >= 0 { "N" } else { "S" },
            lat.abs(),
            if lon >= 0 { "E" } else { "W" },
            lon.abs()
        )
    }

    pub fn load_tile(&self, lat: i32, lon: i32) -> Result<TerrainTile, ElevationError> {
        let path = self.assets_path.join(Self::tile_filename(lat, lon));

        if !path.exists() {
            return Err(ElevationError::TileMissing { lat, lon });
        }

        let unavailable =
            |e: std::io::Error| ElevationError::ProviderUnavailable(format!("{:?}: {}", path, e));

        let mut file = File::open(&path).map_err(unavailable)?;
        let metadata = file.metadata().map_err(unavailable)?;
        let size = match metadata.len() {
            2884802 => SRTM3_SIZE,
            25934402 => SRTM1_SIZE,
            len => {
                return Err(ElevationError::ProviderUnavailable(format!(
                    "{:?}: unknown HGT file size {}",
                    path, len
                )));
            }
        };

        let mut buffer = Vec::with_capacity(size * size * 2);
        file.read_to_end(&mut buffer).map_err(unavailable)?;

        let data: Vec<i16> = buffer
            .chunks_exact(2)
            .map(|chunk| i16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();

        debug!("Loaded terrain tile {:?} ({}x{})", path, size, size);

        Ok(TerrainTile {
            latitude: lat,
            longitude: lon,
            size,
            data,
        })
    }
}

/// SRTM-backed provider with a shared tile cache.
pub struct TerrainManager {
    loader: TerrainLoader,
    cache: TileCache,
}

impl TerrainManager {
    pub fn new(loader: TerrainLoader, cache_capacity: usize) -> Self {
        Self {
            loader,
            cache: TileCache::new(cache_capacity),
        }
    }

    pub fn get_tile(&self, lat: i32, lon: i32) -> Result<Arc<TerrainTile>, ElevationError> {
        let key = TileKey { lat, lon };
        if let Some(tile) = self.cache.get(&key) {
            return Ok(tile);
        }

        let tile = Arc::new(self.loader.load_tile(lat, lon)?);
        self.cache.insert(key, tile.clone());
        Ok(tile)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl ElevationProvider for TerrainManager {
    fn get_elevation(&self, loc: LatLon) -> Result<f64, ElevationError> {
        let lat_deg = loc.latitude.floor() as i32;
        let lon_deg = loc.longitude.floor() as i32;

        let tile = self.get_tile(lat_deg, lon_deg)?;
        // Rows run from the northern edge (lat_deg + 1) down to lat_deg.
        let u = loc.longitude - lon_deg as f64;
        let v = (lat_deg as f64 + 1.0) - loc.latitude;
        tile.sample(u, v).ok_or_else(|| {
            ElevationError::ProviderUnavailable(format!(
                "no data at {:.5},{:.5}",
                loc.latitude, loc.longitude
            ))
        })
    }
}
