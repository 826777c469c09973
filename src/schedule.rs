//! Prayer time schedule from solar altitude angles.
//!
//! Core rule: never fake a physical event. If the sun does not reach an
//! angle on a given day, that event is `None` and reported as such.

use crate::observer::{LocalDay, Observer};
use crate::solar::{self, AngleSolution, SolarPosition, HORIZON_ANGLE};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const CIVIL_TWILIGHT: f64 = 6.0;
pub const NAUTICAL_TWILIGHT: f64 = 12.0;
pub const ASTRONOMICAL_TWILIGHT: f64 = 18.0;

/// Juristic method for the Asr shadow ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Madhab {
    Shafi,
    #[default]
    Hanafi,
}

impl Madhab {
    /// Shadow length as a multiple of object height.
    pub fn shadow_ratio(self) -> f64 {
        match self {
            Madhab::Shafi => 1.0,
            Madhab::Hanafi => 2.0,
        }
    }
}

impl std::fmt::Display for Madhab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Madhab::Shafi => write!(f, "shafi"),
            Madhab::Hanafi => write!(f, "hanafi"),
        }
    }
}

impl std::str::FromStr for Madhab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shafi" | "shafii" | "standard" => Ok(Madhab::Shafi),
            "hanafi" => Ok(Madhab::Hanafi),
            _ => Err(format!("Unknown madhab '{}'. Use 'hanafi' or 'shafi'.", s)),
        }
    }
}

/// Juristic method and twilight depression angles (degrees below horizon).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerConfig {
    pub madhab: Madhab,
    pub fajr_angle: f64,
    pub isha_angle: f64,
}

impl Default for PrayerConfig {
    fn default() -> Self {
        Self {
            madhab: Madhab::Hanafi,
            fajr_angle: 18.0,
            isha_angle: 18.0,
        }
    }
}

/// The state of the solar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayState {
    /// Sun rises and sets normally.
    Normal,
    /// Sun never sets.
    MidnightSun,
    /// Sun never rises.
    PolarNight,
}

impl std::fmt::Display for DayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayState::Normal => write!(f, "Normal"),
            DayState::MidnightSun => write!(f, "MidnightSun"),
            DayState::PolarNight => write!(f, "PolarNight"),
        }
    }
}

/// Prayer and twilight instants for one observer and one local date.
/// `None` means the event does not occur that day.
#[derive(Debug, Clone, Serialize)]
pub struct PrayerSchedule {
    pub date: NaiveDate,
    pub state: DayState,
    pub config: PrayerConfig,
    pub fajr: Option<DateTime<Tz>>,
    pub sunrise: Option<DateTime<Tz>>,
    pub dhuhr: DateTime<Tz>,
    pub asr: Option<DateTime<Tz>>,
    pub maghrib: Option<DateTime<Tz>>,
    pub isha: Option<DateTime<Tz>>,
    pub dawn_civil: Option<DateTime<Tz>>,
    pub dawn_nautical: Option<DateTime<Tz>>,
    pub dawn_astronomical: Option<DateTime<Tz>>,
    pub dusk_civil: Option<DateTime<Tz>>,
    pub dusk_nautical: Option<DateTime<Tz>>,
    pub dusk_astronomical: Option<DateTime<Tz>>,
    /// Maghrib minus sunrise, in seconds.
    pub day_length_secs: Option<i64>,
    pub solar: SolarPosition,
}

impl PrayerSchedule {
    pub fn day_length(&self) -> Option<Duration> {
        self.day_length_secs.map(Duration::seconds)
    }

    /// The six canonical prayers in order, with display names.
    pub fn prayers(&self) -> [(&'static str, Option<DateTime<Tz>>); 6] {
        [
            ("Fajr", self.fajr),
            ("Sunrise", self.sunrise),
            ("Dhuhr", Some(self.dhuhr)),
            ("Asr", self.asr),
            ("Maghrib", self.maghrib),
            ("Isha", self.isha),
        ]
    }
}

/// Classify the day from the sunrise solution.
pub fn classify_day(sunrise: AngleSolution) -> DayState {
    match sunrise {
        AngleSolution::Occurs(_) => DayState::Normal,
        AngleSolution::DoesNotOccur { ratio } if ratio < -1.0 => DayState::MidnightSun,
        AngleSolution::DoesNotOccur { .. } => DayState::PolarNight,
    }
}

/// Convert a UTC hour-of-day solution into a local instant.
fn to_local(base: DateTime<Utc>, hours: f64, tz: Tz) -> DateTime<Tz> {
    let millis = (hours * 3_600_000.0).round() as i64;
    (base + Duration::milliseconds(millis)).with_timezone(&tz)
}

/// Compute the prayer schedule for `date` in the observer's zone.
pub fn compute_schedule(observer: &Observer, config: &PrayerConfig, date: NaiveDate) -> PrayerSchedule {
    let day: LocalDay = observer.local_day(date);
    let solar = solar::solar_position(day.start);
    let base = day.utc_midnight();
    let (lat, lon, tz) = (observer.latitude, observer.longitude, observer.tz);

    let solve = |altitude: f64, rising: bool| {
        solar::hour_offset(altitude, solar.declination, solar.equation_of_time, lat, lon, rising)
    };
    let at = |solution: AngleSolution| solution.hours().map(|h| to_local(base, h, tz));

    let sunrise_solution = solve(HORIZON_ANGLE, true);
    let state = classify_day(sunrise_solution);

    let sunrise = at(sunrise_solution);
    let maghrib = at(solve(HORIZON_ANGLE, false));
    let dhuhr = to_local(base, solar::transit_hour(lon, solar.equation_of_time), tz);
    let asr_angle = solar::asr_altitude(config.madhab.shadow_ratio(), lat, solar.declination);

    let day_length_secs = match (sunrise, maghrib) {
        (Some(sr), Some(mg)) => Some((mg - sr).num_seconds()),
        _ => None,
    };

    PrayerSchedule {
        date,
        state,
        config: *config,
        fajr: at(solve(-config.fajr_angle, true)),
        sunrise,
        dhuhr,
        asr: at(solve(asr_angle, false)),
        maghrib,
        isha: at(solve(-config.isha_angle, false)),
        dawn_civil: at(solve(-CIVIL_TWILIGHT, true)),
        dawn_nautical: at(solve(-NAUTICAL_TWILIGHT, true)),
        dawn_astronomical: at(solve(-ASTRONOMICAL_TWILIGHT, true)),
        dusk_civil: at(solve(-CIVIL_TWILIGHT, false)),
        dusk_nautical: at(solve(-NAUTICAL_TWILIGHT, false)),
        dusk_astronomical: at(solve(-ASTRONOMICAL_TWILIGHT, false)),
        day_length_secs,
        solar,
    }
}
