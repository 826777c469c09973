//! Analytical ephemeris: Moon from Jean Meeus "Astronomical Algorithms" Ch. 47,
//! Sun from the low-order NOAA/SPA series (Ch. 25).
//!
//! Uses the top periodic terms from Tables 47.A and 47.B for ~0.3° lunar
//! accuracy. Universal time is used in place of dynamical time; the ~70 s
//! difference is below the accuracy of the series.

use super::{wrap_longitude, Body, BodyPosition, EphemerisOracle, GeoPoint, HorizontalPosition, AU_KM, DEG};
use crate::error::EphemerisError;
use crate::observer::Observer;
use crate::solar::normalize_degrees;
use chrono::{DateTime, Datelike, Utc};

/// Equatorial radius of the Earth in km.
const EARTH_RADIUS_KM: f64 = 6378.14;

/// Years covered by the series.
pub const COVERAGE: (i32, i32) = (1800, 2200);

// Periodic terms for longitude and distance (Table 47.A)
// Each entry: (D, M, Mp, F, coeff_l, coeff_r)
// coeff_l in units of 0.000001 degrees, coeff_r in units of 0.001 km
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0, -20905355.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0, -3699111.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0, -2955968.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0, -569925.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0, 48888.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0, -3149.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0, 246158.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0, -152138.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0, -170733.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0, -204586.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0, -129620.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0, 108743.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0, 104755.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0, 10321.0),
    (0.0, 0.0, 1.0, 2.0, -12528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10980.0, 79661.0),
    (4.0, 0.0, -1.0, 0.0, 10675.0, -34782.0),
    (0.0, 0.0, 3.0, 0.0, 10034.0, -23210.0),
    (4.0, 0.0, -2.0, 0.0, 8548.0, -21636.0),
    (2.0, 1.0, -1.0, 0.0, -7888.0, 24208.0),
];

// Periodic terms for latitude (Table 47.B)
// Each entry: (D, M, Mp, F, coeff_b)
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5128122.0),
    (0.0, 0.0, 1.0, 1.0, 280602.0),
    (0.0, 0.0, 1.0, -1.0, 277693.0),
    (2.0, 0.0, 0.0, -1.0, 173237.0),
    (2.0, 0.0, -1.0, 1.0, 55413.0),
    (2.0, 0.0, -1.0, -1.0, 46271.0),
    (2.0, 0.0, 0.0, 1.0, 32573.0),
    (0.0, 0.0, 2.0, 1.0, 17198.0),
    (2.0, 0.0, 1.0, -1.0, 9266.0),
    (0.0, 0.0, 2.0, -1.0, 8822.0),
    (2.0, -1.0, 0.0, -1.0, 8216.0),
    (2.0, 0.0, -2.0, -1.0, 4324.0),
    (2.0, 0.0, 1.0, 1.0, 4200.0),
    (2.0, 1.0, 0.0, -1.0, -3359.0),
    (2.0, -1.0, -1.0, 1.0, 2463.0),
    (2.0, -1.0, 0.0, 1.0, 2211.0),
    (2.0, -1.0, -1.0, -1.0, 2065.0),
    (0.0, 1.0, -1.0, -1.0, -1870.0),
    (4.0, 0.0, -1.0, -1.0, 1828.0),
    (0.0, 1.0, 0.0, 1.0, -1794.0),
];

/// Julian date of a UTC instant.
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    2_440_587.5 + t.timestamp_millis() as f64 / 86_400_000.0
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36525.0
}

/// Greenwich mean sidereal time in degrees.
pub fn greenwich_sidereal_time(jd: f64) -> f64 {
    let t = julian_century(jd);
    normalize_degrees(
        280.46061837 + 360.98564736629 * (jd - 2_451_545.0) + 0.000387933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

fn omega(t: f64) -> f64 {
    125.04 - 1934.136 * t
}

fn obliquity_corrected(t: f64) -> f64 {
    let mean = 23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0;
    mean + 0.00256 * (omega(t) * DEG).cos()
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

/// Apparent ecliptic longitude (degrees) and distance (km) of the Sun.
fn sun_ecliptic(t: f64) -> (f64, f64) {
    let l0 = normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032));
    let m = sun_mean_anomaly(t);
    let mr = m * DEG;
    let e = 0.016708634 - t * (0.000042037 + t * 0.0000001267);
    let c = mr.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * mr).sin() * (0.019993 - t * 0.000101)
        + (3.0 * mr).sin() * 0.000289;
    let true_longitude = l0 + c;
    let anomaly = (m + c) * DEG;
    let radius_au = 1.000001018 * (1.0 - e * e) / (1.0 + e * anomaly.cos());
    let apparent = true_longitude - 0.00569 - 0.00478 * (omega(t) * DEG).sin();
    (normalize_degrees(apparent), radius_au * AU_KM)
}

/// Eccentricity factor for terms involving the solar anomaly.
fn e_factor(tm: f64, e: f64) -> f64 {
    match tm.abs() as i32 {
        1 => e,
        2 => e * e,
        _ => 1.0,
    }
}

/// Ecliptic coordinates of the Moon: (longitude_deg, latitude_deg, distance_km).
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let poly = |c: [f64; 5]| normalize_degrees(c[0] + c[1] * t + c[2] * t * t + t * t * t / c[3] + t * t * t * t / c[4]);
    let lp = poly([218.3164477, 481267.88123421, -0.0015786, 538841.0, -65194000.0]);
    let d = poly([297.8501921, 445267.1114034, -0.0018819, 545868.0, -113065000.0]);
    let m = normalize_degrees(357.5291092 + 35999.0502909 * t - 0.0001536 * t * t + t * t * t / 24490000.0);
    let mp = poly([134.9633964, 477198.8675055, 0.0087414, 69699.0, -14712000.0]);
    let f = poly([93.2720950, 483202.0175233, -0.0036539, -3526000.0, 863310000.0]);

    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;

    let (mut sum_l, mut sum_r) = (0.0_f64, 0.0_f64);
    for &(td, tm, tmp, tf, cl, cr) in &TERMS_LR {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        sum_l += cl * e_factor(tm, e) * arg.sin();
        sum_r += cr * e_factor(tm, e) * arg.cos();
    }

    let mut sum_b = 0.0_f64;
    for &(td, tm, tmp, tf, cb) in &TERMS_B {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        sum_b += cb * e_factor(tm, e) * arg.sin();
    }

    // Additive corrections (A1, A2, A3)
    let a1 = normalize_degrees(119.75 + 131.849 * t);
    let a2 = normalize_degrees(53.09 + 479264.290 * t);
    let a3 = normalize_degrees(313.45 + 481266.484 * t);

    sum_l += 3958.0 * (a1 * DEG).sin() + 1962.0 * ((lp - f) * DEG).sin() + 318.0 * (a2 * DEG).sin();

    sum_b += -2235.0 * (lp * DEG).sin() + 382.0 * (a3 * DEG).sin();
    sum_b += 175.0 * ((a1 - f) * DEG).sin() + 175.0 * ((a1 + f) * DEG).sin();
    sum_b += 127.0 * ((lp - mp) * DEG).sin() - 115.0 * ((lp + mp) * DEG).sin();

    (
        normalize_degrees(lp + sum_l / 1_000_000.0),
        sum_b / 1_000_000.0,
        385000.56 + sum_r / 1000.0,
    )
}

/// Ecliptic to equatorial: (right_ascension_deg, declination_deg).
fn ecliptic_to_equatorial(lon: f64, lat: f64, obliquity: f64) -> (f64, f64) {
    let (lon_r, lat_r, obl_r) = (lon * DEG, lat * DEG, obliquity * DEG);

    let sin_ra = lon_r.sin() * obl_r.cos() - lat_r.tan() * obl_r.sin();
    let ra = normalize_degrees(sin_ra.atan2(lon_r.cos()) / DEG);

    let sin_dec = lat_r.sin() * obl_r.cos() + lat_r.cos() * obl_r.sin() * lon_r.sin();
    (ra, sin_dec.asin() / DEG)
}

/// Closed-form oracle; needs no data files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticalEphemeris;

impl AnalyticalEphemeris {
    pub fn new() -> Self {
        Self
    }

    fn check_range(&self, t: DateTime<Utc>) -> Result<(), EphemerisError> {
        let (first, last) = COVERAGE;
        if (first..=last).contains(&t.year()) {
            Ok(())
        } else {
            Err(EphemerisError::OutOfRange(t.to_rfc3339(), first, last))
        }
    }
}

impl EphemerisOracle for AnalyticalEphemeris {
    fn name(&self) -> &str {
        "analytical (Meeus 47 / NOAA)"
    }

    fn position(&self, body: Body, t: DateTime<Utc>) -> Result<BodyPosition, EphemerisError> {
        self.check_range(t)?;
        let tc = julian_century(julian_date(t));
        let (lon, lat, distance_km) = match body {
            Body::Sun => {
                let (lon, r) = sun_ecliptic(tc);
                (lon, 0.0, r)
            }
            Body::Moon => moon_ecliptic(tc),
        };
        let (ra, dec) = ecliptic_to_equatorial(lon, lat, obliquity_corrected(tc));
        Ok(BodyPosition {
            right_ascension: ra,
            declination: dec,
            ecliptic_longitude: lon,
            ecliptic_latitude: lat,
            distance_km,
        })
    }

    fn observe(
        &self,
        body: Body,
        observer: &Observer,
        t: DateTime<Utc>,
    ) -> Result<HorizontalPosition, EphemerisError> {
        let pos = self.position(body, t)?;
        let lst = greenwich_sidereal_time(julian_date(t)) + observer.longitude;
        let hour_angle = wrap_longitude(lst - pos.right_ascension);

        let (ha, dec, lat) = (hour_angle * DEG, pos.declination * DEG, observer.latitude * DEG);
        let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * ha.cos();
        let geo_alt = sin_alt.clamp(-1.0, 1.0).asin();

        let azimuth = normalize_degrees(
            (-dec.cos() * ha.sin()).atan2(dec.sin() * lat.cos() - dec.cos() * lat.sin() * ha.cos()) / DEG,
        );

        // Simplified parallax in altitude
        let parallax = (EARTH_RADIUS_KM / pos.distance_km).asin() * geo_alt.cos();
        let altitude = (geo_alt - parallax) / DEG;

        let d = pos.distance_km;
        let distance_km =
            (d * d + EARTH_RADIUS_KM * EARTH_RADIUS_KM - 2.0 * d * EARTH_RADIUS_KM * geo_alt.sin()).sqrt();

        Ok(HorizontalPosition {
            altitude,
            azimuth,
            distance_km,
            hour_angle,
        })
    }

    fn subpoint(&self, body: Body, t: DateTime<Utc>) -> Result<GeoPoint, EphemerisError> {
        let pos = self.position(body, t)?;
        let gmst = greenwich_sidereal_time(julian_date(t));
        Ok(GeoPoint {
            latitude: pos.declination,
            longitude: wrap_longitude(pos.right_ascension - gmst),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone};

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_julian_date_epochs() {
        assert_abs_diff_eq!(julian_date(utc("2000-01-01T12:00:00Z")), 2_451_545.0);
        assert_abs_diff_eq!(julian_date(utc("1992-04-12T00:00:00Z")), 2_448_724.5);
    }

    #[test]
    fn test_meeus_example_47a() {
        // Meeus Example 47.a: 1992 April 12, 0h TD
        let t = julian_century(julian_date(utc("1992-04-12T00:00:00Z")));
        let (lon, lat, dist) = moon_ecliptic(t);

        // Expected: longitude ~133.17°, latitude ~-3.23°, distance ~368409 km
        assert_abs_diff_eq!(lon, 133.17, epsilon = 0.5);
        assert_abs_diff_eq!(lat, -3.23, epsilon = 0.5);
        assert_abs_diff_eq!(dist, 368409.0, epsilon = 2000.0);
    }

    #[test]
    fn test_sun_example_25a() {
        // Meeus Example 25.a: 1992 October 13, 0h TD
        let eph = AnalyticalEphemeris::new();
        let sun = eph.position(Body::Sun, utc("1992-10-13T00:00:00Z")).unwrap();
        assert_abs_diff_eq!(sun.ecliptic_longitude, 199.909, epsilon = 0.02);
        assert_abs_diff_eq!(sun.right_ascension, 198.378, epsilon = 0.05);
        assert_abs_diff_eq!(sun.declination, -7.785, epsilon = 0.05);
        assert_abs_diff_eq!(sun.distance_km / AU_KM, 0.99766, epsilon = 0.0001);
    }

    #[test]
    fn test_gmst_meeus_example_12a() {
        // 1987 April 10, 0h UT: 13h10m46.3668s
        let gmst = greenwich_sidereal_time(julian_date(utc("1987-04-10T00:00:00Z")));
        assert_abs_diff_eq!(gmst, 197.693195, epsilon = 1e-4);
    }

    #[test]
    fn test_new_moon_low_elongation() {
        // New moon 2024-04-08 18:21 UTC (total solar eclipse).
        let eph = AnalyticalEphemeris::new();
        let elong = eph.elongation(utc("2024-04-08T18:21:00Z")).unwrap();
        assert!(elong < 2.0, "elongation at new moon: {:.2}°", elong);
        assert!(eph.illuminated_fraction(utc("2024-04-08T18:21:00Z")).unwrap() < 0.001);
    }

    #[test]
    fn test_full_moon_high_elongation() {
        // Full moon 2024-04-23 23:49 UTC.
        let eph = AnalyticalEphemeris::new();
        let t = utc("2024-04-23T23:49:00Z");
        assert!(eph.elongation(t).unwrap() > 170.0);
        assert_abs_diff_eq!(eph.phase_angle(t).unwrap(), 180.0, epsilon = 2.0);
        assert!(eph.illuminated_fraction(t).unwrap() > 0.99);
    }

    #[test]
    fn test_observe_sanity_mecca() {
        let eph = AnalyticalEphemeris::new();
        let mecca = Observer::with_zone_name(21.4225, 39.8262, "Asia/Riyadh").unwrap();
        let mut t = utc("2026-02-18T00:00:00Z");
        for _ in 0..48 {
            let pos = eph.observe(Body::Moon, &mecca, t).unwrap();
            assert!((-90.0..=90.0).contains(&pos.altitude));
            assert!((0.0..360.0).contains(&pos.azimuth));
            assert!(pos.distance_km > 350_000.0 && pos.distance_km < 410_000.0);
            assert!(pos.hour_angle > -180.0 && pos.hour_angle <= 180.0);
            t += Duration::minutes(30);
        }
    }

    #[test]
    fn test_sun_at_local_noon_is_south() {
        // Delhi at local solar noon: sun due south, altitude ≈ 90 - lat + dec.
        let eph = AnalyticalEphemeris::new();
        let delhi = Observer::with_zone_name(28.6139, 77.2090, "Asia/Kolkata").unwrap();
        let pos = eph.observe(Body::Sun, &delhi, utc("2024-03-20T06:59:00Z")).unwrap();
        assert_abs_diff_eq!(pos.azimuth, 180.0, epsilon = 2.0);
        assert_abs_diff_eq!(pos.altitude, 61.5, epsilon = 0.5);
        assert!(pos.hour_angle.abs() < 0.5);
    }

    #[test]
    fn test_parallax_lowers_moon() {
        // At the horizon the lunar parallax is close to a full degree.
        let eph = AnalyticalEphemeris::new();
        let t = utc("2024-04-15T00:00:00Z");
        let pos = eph.position(Body::Moon, t).unwrap();
        let hp = (EARTH_RADIUS_KM / pos.distance_km).asin() / DEG;
        assert!(hp > 0.85 && hp < 1.05, "horizontal parallax {}", hp);
    }

    #[test]
    fn test_subpoint_sun_near_greenwich_at_noon() {
        let eph = AnalyticalEphemeris::new();
        let p = eph.subpoint(Body::Sun, utc("2024-03-20T12:00:00Z")).unwrap();
        assert!(p.latitude.abs() < 0.5);
        // Greenwich transit is ~7 min after 12:00 UTC, so the sun is still east.
        assert_abs_diff_eq!(p.longitude, 1.8, epsilon = 0.5);
    }

    #[test]
    fn test_out_of_range() {
        let eph = AnalyticalEphemeris::new();
        let t = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            eph.position(Body::Moon, t),
            Err(EphemerisError::OutOfRange(_, 1800, 2200))
        ));
    }
}
