//! Low-precision analytical solar model and the hour-angle solver.
//!
//! Mean anomaly → ecliptic longitude → declination and equation of time,
//! all from days since J2000.0. Good to well under a minute of time for
//! prayer schedules; not meant for precision astronomy.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Sunrise/sunset altitude: refraction plus the solar semi-diameter.
pub const HORIZON_ANGLE: f64 = -0.833;

/// Solar declination and equation of time at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarPosition {
    /// Degrees.
    pub declination: f64,
    /// Hours.
    pub equation_of_time: f64,
    /// Degrees, in the atan2 range (-180, 180].
    pub right_ascension: f64,
}

/// Outcome of solving the hour-angle equation for a target altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AngleSolution {
    /// UTC hour of day (may fall outside 0..24 for events on an adjacent UTC date).
    Occurs(f64),
    /// The body never reaches the altitude that day. `ratio` is the
    /// out-of-domain acos argument: > 1 means always below, < -1 always above.
    DoesNotOccur { ratio: f64 },
}

impl AngleSolution {
    pub fn hours(self) -> Option<f64> {
        match self {
            AngleSolution::Occurs(h) => Some(h),
            AngleSolution::DoesNotOccur { .. } => None,
        }
    }

    pub fn occurs(self) -> bool {
        matches!(self, AngleSolution::Occurs(_))
    }
}

pub(crate) fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

/// J2000.0: 2000-01-01T12:00:00Z.
pub fn j2000() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Fractional days since J2000.0.
pub fn days_since_j2000(instant: DateTime<Utc>) -> f64 {
    (instant - j2000()).num_milliseconds() as f64 / 86_400_000.0
}

/// Solar position for a day offset from J2000.0.
pub fn solar_position_at(d: f64) -> SolarPosition {
    let mean_anomaly = normalize_degrees(357.5291 + 0.98560028 * d);
    let mean_longitude = normalize_degrees(280.459 + 0.98564736 * d);
    let ecliptic_longitude = normalize_degrees(
        mean_longitude
            + 1.915 * (mean_anomaly * DEG).sin()
            + 0.020 * (2.0 * mean_anomaly * DEG).sin(),
    );
    let obliquity = 23.439 - 0.00000036 * d;

    let lambda = ecliptic_longitude * DEG;
    let epsilon = obliquity * DEG;
    let right_ascension = (epsilon.cos() * lambda.sin()).atan2(lambda.cos()) / DEG;
    let declination = (epsilon.sin() * lambda.sin()).asin() / DEG;

    let mut equation_of_time = mean_longitude / 15.0 - right_ascension / 15.0;
    // Mean longitude has wrapped past 0h while RA has not yet (December).
    if mean_longitude / 15.0 > 20.0 && right_ascension / 15.0 < 4.0 {
        equation_of_time += 24.0;
    }
    // atan2 puts RA in (-180, 180], so the difference can be off by whole days.
    let equation_of_time = (equation_of_time + 12.0).rem_euclid(24.0) - 12.0;

    SolarPosition {
        declination,
        equation_of_time,
        right_ascension,
    }
}

pub fn solar_position(instant: DateTime<Utc>) -> SolarPosition {
    solar_position_at(days_since_j2000(instant))
}

/// Local solar transit in UTC hours.
pub fn transit_hour(longitude: f64, equation_of_time: f64) -> f64 {
    12.0 - longitude / 15.0 - equation_of_time
}

/// UTC hour at which the body reaches `target_altitude` (degrees).
///
/// `rising` selects the branch before transit. An out-of-domain acos
/// argument means the altitude is never reached that day.
pub fn hour_offset(
    target_altitude: f64,
    declination: f64,
    equation_of_time: f64,
    latitude: f64,
    longitude: f64,
    rising: bool,
) -> AngleSolution {
    let lat = latitude * DEG;
    let dec = declination * DEG;
    let ratio = ((target_altitude * DEG).sin() - lat.sin() * dec.sin()) / (lat.cos() * dec.cos());
    if !(-1.0..=1.0).contains(&ratio) {
        return AngleSolution::DoesNotOccur { ratio };
    }

    let mut hour_angle = ratio.acos() / DEG;
    if rising {
        hour_angle = -hour_angle;
    }
    AngleSolution::Occurs(transit_hour(longitude, equation_of_time) + hour_angle / 15.0)
}

/// Asr altitude (degrees) from the shadow-length ratio `k`.
pub fn asr_altitude(shadow_ratio: f64, latitude: f64, declination: f64) -> f64 {
    let zenith_at_noon = ((latitude - declination).abs() * DEG).tan();
    (1.0 / (shadow_ratio + zenith_at_noon)).atan() / DEG
}

/// Convert seconds to HH:MM:SS.
pub fn seconds_to_hms(secs: f64) -> String {
    let total = secs.round() as i64;
    let total = total.rem_euclid(86400);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Datelike, Duration, NaiveDate};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_days_since_epoch() {
        assert_abs_diff_eq!(days_since_j2000(j2000()), 0.0);
        assert_abs_diff_eq!(days_since_j2000(utc(2000, 1, 2)), 0.5);
        assert_abs_diff_eq!(days_since_j2000(utc(1999, 12, 31)), -1.5);
    }

    #[test]
    fn test_equinox_declination_near_zero() {
        let pos = solar_position(utc(2024, 3, 20) + Duration::hours(3));
        assert!(pos.declination.abs() < 0.5, "got {:.3}", pos.declination);
    }

    #[test]
    fn test_solstice_declination() {
        let june = solar_position(utc(2024, 6, 21));
        let december = solar_position(utc(2024, 12, 21));
        assert_abs_diff_eq!(june.declination, 23.44, epsilon = 0.1);
        assert_abs_diff_eq!(december.declination, -23.44, epsilon = 0.1);
    }

    #[test]
    fn test_declination_bounded_all_year() {
        let mut day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        while day.year() < 2026 {
            let pos = solar_position(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap()));
            assert!(pos.declination.abs() <= 23.45);
            day += Duration::days(5);
        }
    }

    #[test]
    fn test_equation_of_time_known_values() {
        // Sun runs ~14 min slow in mid-February and ~16 min fast in early November.
        let feb = solar_position(utc(2024, 2, 11));
        let nov = solar_position(utc(2024, 11, 3));
        assert_abs_diff_eq!(feb.equation_of_time * 60.0, -14.2, epsilon = 1.0);
        assert_abs_diff_eq!(nov.equation_of_time * 60.0, 16.4, epsilon = 1.0);
    }

    #[test]
    fn test_equation_of_time_december_wrap() {
        for d in 20..=31 {
            let pos = solar_position(utc(2024, 12, d));
            assert!(pos.equation_of_time.abs() < 0.5, "Dec {}: {}", d, pos.equation_of_time);
        }
        for d in 1..=10 {
            let pos = solar_position(utc(2025, 1, d));
            assert!(pos.equation_of_time.abs() < 0.5, "Jan {}: {}", d, pos.equation_of_time);
        }
    }

    #[test]
    fn test_hour_offset_branches_symmetric() {
        let rise = hour_offset(HORIZON_ANGLE, 10.0, 0.1, 30.0, 45.0, true).hours().unwrap();
        let set = hour_offset(HORIZON_ANGLE, 10.0, 0.1, 30.0, 45.0, false).hours().unwrap();
        let transit = transit_hour(45.0, 0.1);
        assert_abs_diff_eq!(transit - rise, set - transit, epsilon = 1e-9);
        assert!(rise < transit && transit < set);
    }

    #[test]
    fn test_polar_non_occurrence() {
        // 70°N at the June solstice: sun never sets, twilight never ends.
        let below_never = hour_offset(-18.0, 23.44, 0.0, 70.0, 0.0, true);
        assert!(matches!(below_never, AngleSolution::DoesNotOccur { ratio } if ratio < -1.0));
        assert!(!hour_offset(HORIZON_ANGLE, 23.44, 0.0, 70.0, 0.0, false).occurs());

        // 70°N at the December solstice: sun never rises.
        let above_never = hour_offset(HORIZON_ANGLE, -23.44, 0.0, 70.0, 0.0, true);
        assert!(matches!(above_never, AngleSolution::DoesNotOccur { ratio } if ratio > 1.0));
    }

    #[test]
    fn test_sunrise_exists_mid_latitudes_all_year() {
        let mut day = utc(2024, 1, 1);
        while day < utc(2025, 1, 1) {
            let pos = solar_position(day);
            let mut lat = -60.0;
            while lat <= 60.0 {
                for rising in [true, false] {
                    let s = hour_offset(HORIZON_ANGLE, pos.declination, pos.equation_of_time, lat, 0.0, rising);
                    assert!(s.occurs(), "no horizon crossing at lat {} on {}", lat, day);
                }
                lat += 10.0;
            }
            day += Duration::days(7);
        }
    }

    #[test]
    fn test_asr_altitude_madhab_ordering() {
        for (lat, dec) in [(0.0, 0.0), (28.6, -5.0), (51.5, 23.4), (-33.9, -23.4), (60.0, -23.4)] {
            let shafi = asr_altitude(1.0, lat, dec);
            let hanafi = asr_altitude(2.0, lat, dec);
            assert!(hanafi < shafi, "lat {} dec {}: hanafi {} shafi {}", lat, dec, hanafi, shafi);
        }
        // Sun at zenith: shadow equals object height at 45°.
        assert_abs_diff_eq!(asr_altitude(1.0, 10.0, 10.0), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_seconds_to_hms() {
        assert_eq!(seconds_to_hms(0.0), "00:00:00");
        assert_eq!(seconds_to_hms(3661.4), "01:01:01");
        assert_eq!(seconds_to_hms(-60.0), "23:59:00");
    }
}
