//! The observer and its local calendar day.
//!
//! All arithmetic runs in UTC; events are compared and selected in terms of
//! the observer's local calendar day.

use crate::error::ObserverError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// A point on Earth with its IANA time zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
    pub tz: Tz,
}

impl Observer {
    pub fn new(latitude: f64, longitude: f64, tz: Tz) -> Result<Self, ObserverError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ObserverError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ObserverError::Longitude(longitude));
        }
        Ok(Self { latitude, longitude, tz })
    }

    /// Build an observer from a time-zone name.
    pub fn with_zone_name(latitude: f64, longitude: f64, tz: &str) -> Result<Self, ObserverError> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| ObserverError::TimeZone(tz.to_string()))?;
        Self::new(latitude, longitude, tz)
    }

    pub fn local_day(&self, date: NaiveDate) -> LocalDay {
        LocalDay::new(date, self.tz)
    }

    /// The local calendar day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> LocalDay {
        self.local_day(instant.with_timezone(&self.tz).date_naive())
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }
}

/// A local calendar day expressed as the UTC interval `[start, start + 24h)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalDay {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LocalDay {
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        let start = local_midnight(date, tz);
        Self {
            date,
            start,
            end: start + Duration::hours(24),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn noon(&self) -> DateTime<Utc> {
        self.start + Duration::hours(12)
    }

    /// UTC midnight of the UTC date on which local noon falls. Hour-of-day
    /// solutions in UTC are offsets from this instant, which keeps solar
    /// transit inside `[start, end)` even where the zone offset is far from
    /// longitude / 15 (Pacific/Apia, Pacific/Kiritimati).
    pub fn utc_midnight(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.noon().date_naive().and_time(NaiveTime::default()))
    }
}

/// First valid local instant of `date`. Zones that skip midnight for DST
/// start the day at the first existing local time.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    (0..4)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delhi() -> Observer {
        Observer::with_zone_name(28.6139, 77.2090, "Asia/Kolkata").unwrap()
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert_eq!(
            Observer::new(91.0, 0.0, chrono_tz::UTC),
            Err(ObserverError::Latitude(91.0))
        );
        assert_eq!(
            Observer::new(0.0, -181.0, chrono_tz::UTC),
            Err(ObserverError::Longitude(-181.0))
        );
        assert!(matches!(
            Observer::with_zone_name(0.0, 0.0, "Mars/Olympus"),
            Err(ObserverError::TimeZone(_))
        ));
    }

    #[test]
    fn test_local_day_bounds_kolkata() {
        let day = delhi().local_day(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        // 00:00 IST = 18:30 UTC the previous day
        assert_eq!(day.start.to_rfc3339(), "2024-03-19T18:30:00+00:00");
        assert_eq!(day.end - day.start, Duration::hours(24));
        assert_eq!(day.noon().to_rfc3339(), "2024-03-20T06:30:00+00:00");
        assert_eq!(day.utc_midnight().to_rfc3339(), "2024-03-20T00:00:00+00:00");
    }

    #[test]
    fn test_utc_midnight_follows_local_noon() {
        let apia = Observer::with_zone_name(-13.83, -171.75, "Pacific/Apia").unwrap();
        let day = apia.local_day(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        // 00:00 +13 = 11:00 UTC the previous day; local noon is 23:00 UTC that same day.
        assert_eq!(day.start.to_rfc3339(), "2024-03-19T11:00:00+00:00");
        assert_eq!(day.utc_midnight().to_rfc3339(), "2024-03-19T00:00:00+00:00");
    }

    #[test]
    fn test_contains_is_half_open() {
        let day = delhi().local_day(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert!(day.contains(day.start));
        assert!(day.contains(day.end - Duration::seconds(1)));
        assert!(!day.contains(day.end));
    }

    #[test]
    fn test_zone_round_trip() {
        let observer = Observer::with_zone_name(40.7128, -74.0060, "America/New_York").unwrap();
        let instants = [
            "2024-03-10T06:59:59Z", // just before the spring-forward gap
            "2024-03-10T07:00:00Z",
            "2024-11-03T05:30:00Z", // inside the repeated hour
            "2024-11-03T06:30:00Z",
            "2024-06-21T16:00:00Z",
        ];
        for s in instants {
            let utc: DateTime<Utc> = s.parse().unwrap();
            let local = observer.to_local(utc);
            assert_eq!(local.with_timezone(&Utc), utc, "round trip failed for {}", s);
        }
    }

    #[test]
    fn test_day_of_uses_local_calendar() {
        let observer = delhi();
        let utc: DateTime<Utc> = "2024-03-19T20:00:00Z".parse().unwrap();
        assert_eq!(observer.day_of(utc).date, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    }
}
