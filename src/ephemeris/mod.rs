//! Ephemeris oracle: where a body is, as seen from the geocentre or an observer.
//!
//! The event search only ever talks to [`EphemerisOracle`]. The bundled
//! [`analytical::AnalyticalEphemeris`] answers from closed-form series; a
//! disabled source makes every lunar section degrade to "unavailable".

pub mod analytical;

use crate::error::EphemerisError;
use crate::observer::Observer;
use crate::solar::normalize_degrees;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub use analytical::AnalyticalEphemeris;

pub(crate) const DEG: f64 = PI / 180.0;

/// Kilometres per astronomical unit (IAU 2012).
pub const AU_KM: f64 = 149_597_870.7;
/// Miles per astronomical unit.
pub const AU_MILES: f64 = 92_955_807.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Moon,
}

impl std::fmt::Display for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Sun => write!(f, "Sun"),
            Body::Moon => write!(f, "Moon"),
        }
    }
}

/// Geocentric apparent position. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyPosition {
    /// [0, 360).
    pub right_ascension: f64,
    pub declination: f64,
    pub ecliptic_longitude: f64,
    pub ecliptic_latitude: f64,
    pub distance_km: f64,
}

/// Topocentric horizontal position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalPosition {
    /// Degrees above the horizon, parallax applied, no refraction.
    pub altitude: f64,
    /// Degrees from north through east, [0, 360).
    pub azimuth: f64,
    pub distance_km: f64,
    /// Local hour angle in degrees, (-180, 180]. Negative east of the meridian.
    pub hour_angle: f64,
}

impl HorizontalPosition {
    pub fn distance_miles(&self) -> f64 {
        self.distance_km / AU_KM * AU_MILES
    }

    pub fn east_of_meridian(&self) -> bool {
        (self.hour_angle * DEG).sin() < 0.0
    }
}

/// A terrestrial point in degrees; longitude in (-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Wrap a longitude into (-180, 180].
pub fn wrap_longitude(lon: f64) -> f64 {
    let l = normalize_degrees(lon);
    if l > 180.0 {
        l - 360.0
    } else {
        l
    }
}

/// Answers position queries for the Sun and Moon.
///
/// Implementations are pure: the same query always yields the same answer.
pub trait EphemerisOracle {
    fn name(&self) -> &str;

    fn position(&self, body: Body, t: DateTime<Utc>) -> Result<BodyPosition, EphemerisError>;

    fn observe(
        &self,
        body: Body,
        observer: &Observer,
        t: DateTime<Utc>,
    ) -> Result<HorizontalPosition, EphemerisError>;

    /// Point on Earth with the body at its zenith.
    fn subpoint(&self, body: Body, t: DateTime<Utc>) -> Result<GeoPoint, EphemerisError>;

    /// Moon–Sun angular separation in degrees, [0, 180].
    fn elongation(&self, t: DateTime<Utc>) -> Result<f64, EphemerisError> {
        let moon = self.position(Body::Moon, t)?;
        let sun = self.position(Body::Sun, t)?;
        let d_lon = (moon.ecliptic_longitude - sun.ecliptic_longitude) * DEG;
        let cos_e = (moon.ecliptic_latitude * DEG).cos() * d_lon.cos();
        Ok(cos_e.clamp(-1.0, 1.0).acos() / DEG)
    }

    /// Illuminated fraction of the lunar disc, [0, 1].
    fn illuminated_fraction(&self, t: DateTime<Utc>) -> Result<f64, EphemerisError> {
        let e = self.elongation(t)?;
        Ok((1.0 - (e * DEG).cos()) / 2.0)
    }

    /// Moon minus Sun ecliptic longitude, [0, 360). 0 is New, 180 Full.
    fn phase_angle(&self, t: DateTime<Utc>) -> Result<f64, EphemerisError> {
        let moon = self.position(Body::Moon, t)?;
        let sun = self.position(Body::Sun, t)?;
        Ok(normalize_degrees(moon.ecliptic_longitude - sun.ecliptic_longitude))
    }
}

/// Which oracle to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EphemerisSource {
    #[default]
    Analytical,
    /// Run solar-only.
    Disabled,
}

/// Load the configured oracle. Failure is reported, never fatal.
pub fn load(source: EphemerisSource) -> Result<Box<dyn EphemerisOracle>, EphemerisError> {
    match source {
        EphemerisSource::Analytical => {
            log::debug!("Loaded analytical ephemeris");
            Ok(Box::new(AnalyticalEphemeris::new()))
        }
        EphemerisSource::Disabled => Err(EphemerisError::Unavailable(
            "ephemeris disabled by configuration".into(),
        )),
    }
}
