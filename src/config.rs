//! Configuration file at `<config_dir>/qibla-numa/config.json`.
//!
//! Every field is optional; missing fields take their defaults. CLI flags
//! are applied on top by the binary.

use crate::ephemeris::EphemerisSource;
use crate::error::ConfigError;
use crate::schedule::PrayerConfig;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "qibla-numa";
const FILE_NAME: &str = "config.json";

/// Whether IP auto-detection may be used when nothing else resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub mode: LocationMode,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// IANA zone; resolved from coordinates when absent.
    pub timezone: Option<String>,
}

impl LocationConfig {
    /// "city, state, country" with empty parts dropped. No city, no address.
    pub fn address(&self) -> Option<String> {
        fn part(p: &Option<String>) -> Option<&str> {
            p.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        let city = part(&self.city)?;
        let parts: Vec<&str> = std::iter::once(city)
            .chain(part(&self.state))
            .chain(part(&self.country))
            .collect();
        Some(parts.join(", "))
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub prayer: PrayerConfig,
    pub location: LocationConfig,
    /// Disable every network provider.
    pub offline: bool,
    pub ephemeris: EphemerisSource,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(FILE_NAME))
    }

    /// Load from an explicit path (which must exist) or the default path
    /// (which may be absent).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => {
                    log::debug!("No config file; using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse { path: display, source })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, angle) in [
            ("prayer.fajr_angle", self.prayer.fajr_angle),
            ("prayer.isha_angle", self.prayer.isha_angle),
        ] {
            if !(angle > 0.0 && angle <= 30.0) {
                return Err(ConfigError::invalid(field, format!("{angle} is outside (0, 30]")));
            }
        }
        if let Some(lat) = self.location.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::invalid("location.latitude", format!("{lat} is outside [-90, 90]")));
            }
        }
        if let Some(lon) = self.location.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::invalid("location.longitude", format!("{lon} is outside [-180, 180]")));
            }
        }
        if let Some(tz) = &self.location.timezone {
            tz.parse::<Tz>()
                .map_err(|_| ConfigError::invalid("location.timezone", format!("unknown zone '{tz}'")))?;
        }
        Ok(())
    }
}
