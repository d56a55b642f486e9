use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{fetcher::DEFAULT_ENDPOINT, location::PositionOptions, model::Coordinates};

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// endpoint = "http://api.sunrise-sunset.org/json"
/// location_timeout_ms = 15000
/// location_maximum_age_ms = 60000
/// latitude = 37.7749
/// longitude = -122.4194
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sunrise/sunset lookup endpoint.
    pub endpoint: String,

    pub location_timeout_ms: u64,
    pub location_maximum_age_ms: u64,

    /// Fixed location. When either is missing the location is looked up by IP.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        let options = PositionOptions::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            location_timeout_ms: options.timeout.as_millis() as u64,
            location_maximum_age_ms: options.maximum_age.as_millis() as u64,
            latitude: None,
            longitude: None,
        }
    }
}

impl Config {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(self.location_timeout_ms),
            maximum_age: Duration::from_millis(self.location_maximum_age_ms),
        }
    }

    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }

    /// Set the fixed location, rejecting out-of-range values.
    pub fn set_fixed_coordinates(&mut self, coords: Coordinates) -> Result<()> {
        validate_coordinates(&coords)?;
        self.latitude = Some(coords.latitude);
        self.longitude = Some(coords.longitude);
        Ok(())
    }

    pub fn clear_fixed_coordinates(&mut self) {
        self.latitude = None;
        self.longitude = None;
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        if let Some(coords) = cfg.fixed_coordinates() {
            validate_coordinates(&coords)?;
        }
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "day-and-night", "daynight")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

pub fn validate_coordinates(coords: &Coordinates) -> Result<()> {
    if !(-90.0..=90.0).contains(&coords.latitude) {
        return Err(anyhow!("Latitude {} is out of range (-90..=90)", coords.latitude));
    }
    if !(-180.0..=180.0).contains(&coords.longitude) {
        return Err(anyhow!("Longitude {} is out of range (-180..=180)", coords.longitude));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_companion_behaviour() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint, "http://api.sunrise-sunset.org/json");
        assert_eq!(cfg.position_options(), PositionOptions::default());
        assert!(cfg.fixed_coordinates().is_none());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg = Config::from_toml("latitude = 52.37\nlongitude = 4.89\n").unwrap();
        assert_eq!(cfg.fixed_coordinates(), Some(Coordinates::new(52.37, 4.89)));
        assert_eq!(cfg.location_timeout_ms, 15_000);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn latitude_without_longitude_is_not_fixed() {
        let cfg = Config::from_toml("latitude = 52.37\n").unwrap();
        assert!(cfg.fixed_coordinates().is_none());
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let err = Config::from_toml("latitude = 123.0\nlongitude = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("Latitude"));

        let mut cfg = Config::default();
        assert!(cfg.set_fixed_coordinates(Coordinates::new(0.0, 200.0)).is_err());
        assert!(cfg.fixed_coordinates().is_none());
    }

    #[test]
    fn toml_roundtrip_keeps_fixed_location() {
        let mut cfg = Config::default();
        cfg.set_fixed_coordinates(Coordinates::new(37.7749, -122.4194)).unwrap();
        cfg.location_timeout_ms = 5_000;

        let text = cfg.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);

        cfg.clear_fixed_coordinates();
        assert!(cfg.fixed_coordinates().is_none());
    }
}
