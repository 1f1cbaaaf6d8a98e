use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::coverage::CoverageBoundary;
use crate::geo::{LatLon, angular_difference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntennaClass {
    #[serde(alias = "BACKHAUL", alias = "ptp")]
    Backhaul,
    #[serde(alias = "SECTOR")]
    Sector,
    #[default]
    #[serde(alias = "STANDARD", alias = "omni")]
    Standard,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AntennaError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("azimuth {0} outside [0, 360)")]
    AzimuthOutOfRange(f64),
    #[error("beam width {0} outside (0, 360]")]
    BeamWidthOutOfRange(f64),
    #[error("downtilt {0} outside [-90, 90]")]
    DowntiltOutOfRange(f64),
    #[error("duplicate antenna name {0:?}")]
    DuplicateName(String),
}

/// A transmitter site. Field aliases accept the flat `height`/`power`/`frequency`
/// layout used by existing antenna sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "height")]
    pub height_m: f64, // above ground
    #[serde(alias = "power")]
    pub power_w: f64,
    #[serde(alias = "frequency")]
    pub frequency_ghz: f64,
    #[serde(default, alias = "azimuth", alias = "direction")]
    pub azimuth_deg: Option<f64>,
    #[serde(default, alias = "beam_width")]
    pub beam_width_deg: Option<f64>,
    #[serde(default, alias = "tilt", alias = "downtilt")]
    pub downtilt_deg: Option<f64>,
    #[serde(default, alias = "type")]
    pub class: AntennaClass,
}

impl Antenna {
    pub fn new(
        name: impl Into<String>,
        location: LatLon,
        height_m: f64,
        power_w: f64,
        frequency_ghz: f64,
        class: AntennaClass,
    ) -> Self {
        Self {
            name: name.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            height_m,
            power_w,
            frequency_ghz,
            azimuth_deg: None,
            beam_width_deg: None,
            downtilt_deg: None,
            class,
        }
    }

    pub fn with_beam(mut self, azimuth_deg: f64, beam_width_deg: f64) -> Self {
        self.azimuth_deg = Some(azimuth_deg);
        self.beam_width_deg = Some(beam_width_deg);
        self
    }

    pub fn with_downtilt(mut self, downtilt_deg: f64) -> Self {
        self.downtilt_deg = Some(downtilt_deg);
        self
    }

    pub fn location(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), AntennaError> {
        if self.name.trim().is_empty() {
            return Err(AntennaError::EmptyName);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AntennaError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AntennaError::LongitudeOutOfRange(self.longitude));
        }
        for (field, value) in [
            ("height", self.height_m),
            ("power", self.power_w),
            ("frequency", self.frequency_ghz),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AntennaError::NotPositive { field, value });
            }
        }
        if let Some(az) = self.azimuth_deg {
            if !(0.0..360.0).contains(&az) {
                return Err(AntennaError::AzimuthOutOfRange(az));
            }
        }
        if let Some(bw) = self.beam_width_deg {
            if !(bw > 0.0 && bw <= 360.0) {
                return Err(AntennaError::BeamWidthOutOfRange(bw));
            }
        }
        if let Some(tilt) = self.downtilt_deg {
            if !(-90.0..=90.0).contains(&tilt) {
                return Err(AntennaError::DowntiltOutOfRange(tilt));
            }
        }
        Ok(())
    }

    /// Main-lobe azimuth and beam width, only when the pattern is narrower than a
    /// full circle.
    pub fn beam(&self) -> Option<(f64, f64)> {
        match (self.azimuth_deg, self.beam_width_deg) {
            (Some(az), Some(bw)) if bw < 360.0 => Some((az, bw)),
            _ => None,
        }
    }

    /// Whether `bearing_deg` falls inside `[azimuth - bw/2, azimuth + bw/2]`.
    pub fn covers_bearing(&self, bearing_deg: f64) -> bool {
        match self.beam() {
            Some((az, bw)) => angular_difference(bearing_deg, az) <= bw / 2.0,
            None => true,
        }
    }
}

/// Rejects antennas whose name already appeared earlier in the list.
pub fn check_unique_names(antennas: &[Antenna]) -> Vec<Result<(), AntennaError>> {
    let mut seen = HashSet::new();
    antennas
        .iter()
        .map(|a| {
            if seen.insert(a.name.as_str()) {
                Ok(())
            } else {
                Err(AntennaError::DuplicateName(a.name.clone()))
            }
        })
        .collect()
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Load antennas from a `.json` array or a `.csv` sheet with a header row.
pub fn load_antennas(path: &Path) -> anyhow::Result<Vec<Antenna>> {
    let antennas = match extension(path).as_deref() {
        Some("json") => load_antennas_from_json(path)?,
        Some("csv") => load_antennas_from_csv(path)?,
        _ => bail!("unsupported antenna file {:?}: use .json or .csv", path),
    };
    info!("Loaded {} antennas from {:?}", antennas.len(), path);
    Ok(antennas)
}

pub fn load_antennas_from_json(path: &Path) -> anyhow::Result<Vec<Antenna>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::new(file);
    let antennas: Vec<Antenna> = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse antennas in {:?}", path))?;
    Ok(antennas)
}

pub fn load_antennas_from_csv(path: &Path) -> anyhow::Result<Vec<Antenna>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let mut antennas = Vec::new();
    for (row, record) in reader.deserialize().enumerate() {
        let antenna: Antenna =
            record.with_context(|| format!("Bad antenna row {} in {:?}", row + 1, path))?;
        antennas.push(antenna);
    }
    Ok(antennas)
}

pub fn save_antennas(antennas: &[Antenna], path: &Path) -> anyhow::Result<()> {
    match extension(path).as_deref() {
        Some("json") => {
            let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            serde_json::to_writer_pretty(BufWriter::new(file), antennas)?;
        }
        Some("csv") => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            for antenna in antennas {
                writer.serialize(antenna)?;
            }
            writer.flush()?;
        }
        _ => bail!("unsupported antenna file {:?}: use .json or .csv", path),
    }
    Ok(())
}

/// GeoJSON `FeatureCollection` with one closed polygon per boundary.
pub fn boundaries_to_geojson(boundaries: &[CoverageBoundary]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = boundaries
        .iter()
        .map(|b| {
            let ring: Vec<[f64; 2]> = b
                .to_polygon()
                .iter()
                .map(|p| [p.longitude, p.latitude])
                .collect();
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring]
                },
                "properties": {
                    "name": b.antenna,
                    "class": b.class,
                    "degraded": b.degraded,
                    "min_distance_m": b.min_distance(),
                    "max_distance_m": b.max_distance(),
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn save_boundaries_json(boundaries: &[CoverageBoundary], path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), boundaries)?;
    Ok(())
}

pub fn save_geojson(boundaries: &[CoverageBoundary], path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &boundaries_to_geojson(boundaries))?;
    Ok(())
}
