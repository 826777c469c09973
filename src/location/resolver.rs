//! Location resolver: orchestrates the fallback chain.
//!
//! Order:   explicit coordinates → address → IP auto-detect → error
//! Address: gazetteer exact → Nominatim → gazetteer fuzzy
//! Zone:    configured → provider → timeapi.io → nearest city (≤ 1000 km) → Etc/GMT±N

use super::providers;
use super::types::{LocationSource, ResolvedLocation, ZoneSource};
use crate::config::{LocationConfig, LocationMode};
use crate::ephemeris::GeoPoint;
use crate::error::{LocationError, ObserverError};
use crate::geo::{City, Gazetteer};
use chrono_tz::Tz;

/// Gazetteer cities farther than this don't lend their zone to a point.
pub const NEAREST_ZONE_RADIUS_KM: f64 = 1000.0;

/// The location resolver with its fallback pipeline.
pub struct LocationResolver {
    gazetteer: Gazetteer,
    offline: bool,
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationResolver {
    pub fn new() -> Self {
        Self {
            gazetteer: Gazetteer::builtin(),
            offline: false,
        }
    }

    /// Offline mode skips every network call.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Run every configured strategy in order; the first success wins.
    /// Failures are logged and collected into [`LocationError::Unresolved`].
    pub fn resolve(&self, config: &LocationConfig) -> Result<ResolvedLocation, LocationError> {
        let zone = config.timezone.as_deref();
        let mut attempts = Vec::new();

        if let Some((lat, lon)) = config.coordinates() {
            match self.from_coordinates(lat, lon, zone) {
                Ok(loc) => return Ok(loc),
                Err(e) => record(&mut attempts, "coordinates", e),
            }
        }

        if let Some(address) = config.address() {
            match self.from_address(&address).and_then(|loc| with_zone_override(loc, zone)) {
                Ok(loc) => return Ok(loc),
                Err(e) => record(&mut attempts, "address", e),
            }
        }

        if config.mode == LocationMode::Auto {
            match self.from_ip().and_then(|loc| with_zone_override(loc, zone)) {
                Ok(loc) => return Ok(loc),
                Err(e) => record(&mut attempts, "ip", e),
            }
        }

        if attempts.is_empty() {
            attempts.push(LocationError::NoInput.to_string());
        }
        Err(LocationError::Unresolved(attempts))
    }

    /// Validated explicit coordinates with a configured or derived zone.
    pub fn from_coordinates(&self, lat: f64, lon: f64, zone: Option<&str>) -> Result<ResolvedLocation, LocationError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ObserverError::Latitude(lat).into());
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ObserverError::Longitude(lon).into());
        }
        let (tz, zone_source) = match zone {
            Some(z) => (z.to_string(), ZoneSource::Configured),
            None => self.zone_for(lat, lon),
        };
        validated(ResolvedLocation {
            name: format!("{:.4}, {:.4}", lat, lon),
            lat,
            lon,
            tz,
            source: LocationSource::Manual,
            zone_source,
            display_name: None,
            country_code: None,
        })
    }

    /// Free-text address, e.g. "Medina, Saudi Arabia" or "Springfield, IL, US".
    pub fn from_address(&self, query: &str) -> Result<ResolvedLocation, LocationError> {
        let (city, hint) = parse_address(query);
        if city.is_empty() {
            return Err(LocationError::NoInput);
        }

        if let Some(found) = self.gazetteer.exact(&city, hint.as_deref()) {
            log::debug!("Gazetteer exact match for '{}'", query);
            return validated(from_city(found));
        }

        if !self.offline {
            match providers::nominatim_geocode(query, hint.as_deref()) {
                Ok(top) => {
                    let (tz, zone_source) = self.zone_for(top.lat, top.lon);
                    let loc = ResolvedLocation {
                        name: top.name,
                        lat: top.lat,
                        lon: top.lon,
                        tz,
                        source: LocationSource::Nominatim,
                        zone_source,
                        display_name: Some(top.display_name),
                        country_code: (!top.country_code.is_empty()).then_some(top.country_code),
                    };
                    match validated(loc) {
                        Ok(loc) => return Ok(loc),
                        Err(e) => log::warn!("Nominatim result for '{}' rejected: {}", query, e),
                    }
                }
                Err(e) => log::warn!("Nominatim lookup for '{}' failed: {}", query, e),
            }
        }

        match self.gazetteer.fuzzy(&simplify_query(&city), hint.as_deref()) {
            Some(found) => {
                log::info!("Fuzzy gazetteer match '{}' for '{}'", found.name(), query);
                validated(from_city(found))
            }
            None => Err(LocationError::NotFound(query.to_string())),
        }
    }

    /// Auto-detect location via IP.
    pub fn from_ip(&self) -> Result<ResolvedLocation, LocationError> {
        if self.offline {
            return Err(LocationError::Offline);
        }
        let (mut loc, provider_zone) = providers::ip_geolocate()?;
        match provider_zone.filter(|z| z.parse::<Tz>().is_ok()) {
            Some(tz) => loc.tz = tz,
            None => {
                let (tz, zone_source) = self.zone_for(loc.lat, loc.lon);
                loc.tz = tz;
                loc.zone_source = zone_source;
            }
        }
        validated(loc)
    }

    /// Zone for a point: timeapi.io when online, else the nearest gazetteer
    /// city within [`NEAREST_ZONE_RADIUS_KM`], else a fixed offset from
    /// longitude.
    pub fn zone_for(&self, lat: f64, lon: f64) -> (String, ZoneSource) {
        if !self.offline {
            match providers::zone_from_api(lat, lon) {
                Ok(tz) if tz.parse::<Tz>().is_ok() => return (tz, ZoneSource::TimeApi),
                Ok(tz) => log::warn!("timeapi.io returned unknown zone '{}'", tz),
                Err(e) => log::warn!("timeapi.io lookup failed: {}", e),
            }
        }

        let nearby = self
            .gazetteer
            .nearest(GeoPoint {
                latitude: lat,
                longitude: lon,
            })
            .filter(|(_, km)| *km <= NEAREST_ZONE_RADIUS_KM)
            .and_then(|(city, _)| city.zone());
        match nearby {
            Some(tz) => (tz.name().to_string(), ZoneSource::NearestCity),
            None => (offset_zone(lon), ZoneSource::LongitudeOffset),
        }
    }
}

fn record(attempts: &mut Vec<String>, strategy: &str, err: LocationError) {
    log::warn!("Location strategy '{}' failed: {}", strategy, err);
    attempts.push(format!("{}: {}", strategy, err));
}

fn validated(loc: ResolvedLocation) -> Result<ResolvedLocation, LocationError> {
    loc.to_observer()?;
    Ok(loc)
}

fn with_zone_override(mut loc: ResolvedLocation, zone: Option<&str>) -> Result<ResolvedLocation, LocationError> {
    if let Some(z) = zone {
        loc.tz = z.to_string();
        loc.zone_source = ZoneSource::Configured;
    }
    validated(loc)
}

fn from_city(city: &City) -> ResolvedLocation {
    ResolvedLocation {
        name: city.name().to_string(),
        lat: city.lat,
        lon: city.lon,
        tz: city.tz.to_string(),
        source: LocationSource::Gazetteer,
        zone_source: ZoneSource::Provider,
        display_name: Some(format!("{}, {}", city.name(), city.country)),
        country_code: Some(city.country_code.to_string()),
    }
}

/// `Etc/GMT±N` for the nearest whole-hour meridian. POSIX sign convention:
/// `Etc/GMT-5` is five hours *ahead* of UTC.
fn offset_zone(lon: f64) -> String {
    let hours = (lon / 15.0).round() as i32;
    match hours {
        0 => "Etc/GMT".to_string(),
        h if h > 0 => format!("Etc/GMT-{}", h),
        h => format!("Etc/GMT+{}", -h),
    }
}

/// Split "City, Region, Country" into the city and an ISO country hint
/// taken from the last component when it names a country.
fn parse_address(query: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = query.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    let city = parts.first().map(|s| s.to_string()).unwrap_or_default();
    let hint = match parts.as_slice() {
        [_, .., last] => {
            if last.len() == 2 && last.chars().all(|c| c.is_ascii_alphabetic()) {
                Some(last.to_uppercase())
            } else {
                providers::country_name_to_code(last).map(str::to_string)
            }
        }
        _ => None,
    };
    (city, hint)
}

/// Simplify a query for retry: lowercase, strip accents/diacritics, collapse spaces.
fn simplify_query(q: &str) -> String {
    q.to_lowercase()
        .replace('ø', "o")
        .replace('å', "a")
        .replace('ä', "a")
        .replace('ö', "o")
        .replace('ü', "u")
        .replace('ß', "ss")
        .replace(['é', 'è', 'ê'], "e")
        .replace('ñ', "n")
        .replace(['ã', 'á'], "a")
        .replace('õ', "o")
        .replace('ç', "c")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
