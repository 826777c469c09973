//! Core types for the location subsystem.

use crate::error::ObserverError;
use crate::observer::Observer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a location was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    Manual,
    Gazetteer,
    Nominatim,
    IpApi,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "Manual"),
            Self::Gazetteer => write!(f, "Built-in"),
            Self::Nominatim => write!(f, "Nominatim"),
            Self::IpApi => write!(f, "IP"),
        }
    }
}

/// Where the time zone of a location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSource {
    Configured,
    Provider,
    TimeApi,
    NearestCity,
    LongitudeOffset,
}

/// A fully resolved location with coordinates, timezone, and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub tz: String,
    pub source: LocationSource,
    pub zone_source: ZoneSource,
    /// Full display name from provider (e.g. "Medina, Al Madinah, Saudi Arabia")
    #[serde(default)]
    pub display_name: Option<String>,
    /// ISO 3166-1 alpha-2 country code (e.g. "SA", "US")
    #[serde(default)]
    pub country_code: Option<String>,
}

impl ResolvedLocation {
    pub fn to_observer(&self) -> Result<Observer, ObserverError> {
        Observer::with_zone_name(self.lat, self.lon, &self.tz)
    }

    pub fn display_line(&self) -> String {
        let label = self.display_name.as_deref().unwrap_or(&self.name);
        format!(
            "{} ({}) {} [{}]",
            label,
            format_coords(self.lat, self.lon),
            self.tz,
            self.source
        )
    }
}

/// "21.4225°N, 39.8262°E"
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}°{}, {:.4}°{}", lat.abs(), ns, lon.abs(), ew)
}
