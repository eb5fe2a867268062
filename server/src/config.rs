//! Configuration loading for the server.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Environment variable naming the tracks folder, used when none is given on the command line.
pub const TRACKS_FOLDER_ENV: &str = "TRACK_VIEWER_TRACKS_FOLDER";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// A map tile source offered by the map views.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TileLayer {
    /// Leaflet style URL template, e.g. `https://{s}.tile.osm.org/{z}/{x}/{y}.png`
    pub url: String,
    pub attribution: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl TileLayer {
    fn new(url: &str, attribution: &str) -> Self {
        Self {
            url: url.to_string(),
            attribution: attribution.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracks_folder: Option<PathBuf>,
    /// Fixed UTC offset such as `+01:00`, used to build report periods
    pub timezone: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub default_tile_layer: String,
    pub tile_layers: BTreeMap<String, TileLayer>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracks_folder: None,
            timezone: "+01:00".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            log_file: None,
            default_tile_layer: "Cycle".to_string(),
            tile_layers: default_tile_layers(),
        }
    }
}

fn default_tile_layers() -> BTreeMap<String, TileLayer> {
    BTreeMap::from([
        (
            "Normal".to_string(),
            TileLayer::new("https://{s}.tile.osm.org/{z}/{x}/{y}.png", "OpenStreetMap"),
        ),
        (
            "Cycle".to_string(),
            TileLayer::new(
                "https://{s}.tile.thunderforest.com/cycle/{z}/{x}/{y}.png",
                "Thunderforest and OpenStreetMap contributors",
            ),
        ),
        (
            "Outdoors".to_string(),
            TileLayer::new(
                "https://tile.thunderforest.com/outdoors/{z}/{x}/{y}.png",
                "Thunderforest and OpenStreetMap contributors",
            ),
        ),
        (
            "Satellite".to_string(),
            TileLayer::new(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                "Esri, Maxar, Earthstar Geographics, and the GIS User Community",
            ),
        ),
    ])
}

impl Config {
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        let timezone = self.timezone.trim();
        if timezone.eq_ignore_ascii_case("utc") || timezone == "Z" {
            return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("UTC offset out of range"));
        }

        timezone
            .parse::<FixedOffset>()
            .map_err(|err| anyhow!("Invalid timezone offset {:?}: {err}", self.timezone))
    }

    pub fn validate(&self) -> Result<()> {
        self.utc_offset()?;

        if !self.tile_layers.contains_key(&self.default_tile_layer) {
            bail!(
                "Default tile layer {:?} is not one of the configured layers {:?}",
                self.default_tile_layer,
                self.tile_layers.keys().collect::<Vec<_>>()
            );
        }

        Ok(())
    }

    /// Picks the tracks folder: command line first, then the environment, then this file.
    pub fn resolve_tracks_folder(&self, cli: Option<PathBuf>, env: Option<String>) -> Result<PathBuf> {
        let folder = cli
            .or_else(|| env.filter(|value| !value.is_empty()).map(PathBuf::from))
            .or_else(|| self.tracks_folder.clone())
            .context("No tracks folder provided")?;

        Ok(expand_home(&folder))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Reads the TOML configuration at `path`, falling back to the defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&contents).context("Failed to parse config file as TOML")?;

    config.validate()?;
    Ok(config)
}
