//! Lunar rise, transit, set and 45° crossings for one local day.
//!
//! Each category is searched and selected independently, then a single
//! consistency pass anchors the pass on the selected transit so that
//! `rise ≤ ascent_45 ≤ transit ≤ descent_45 ≤ set` holds whenever all five
//! are present. After that pass nothing is mutated.

use crate::ephemeris::{Body, EphemerisOracle, AU_KM};
use crate::error::EphemerisError;
use crate::observer::{LocalDay, Observer};
use crate::search::{self, Candidate, EventWindow, SearchResult, Transition};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use serde::Serialize;

/// Rise/set altitude: standard refraction at the horizon, upper limb ignored.
pub const MOON_HORIZON: f64 = -34.0 / 60.0;
pub const ASCENT_ALTITUDE: f64 = 45.0;

/// Widening applied around the target day for each search.
const HORIZON_MARGIN_DAYS: i64 = 30;
const ASCENT_MARGIN_DAYS: i64 = 3;
const FALLBACK_MARGIN_DAYS: i64 = 2;

const COARSE_STEP_MINUTES: i64 = 10;
const FALLBACK_STEP_MINUTES: i64 = 5;

/// How an event instant was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventOrigin {
    /// Selected directly from a search.
    Measured,
    /// Replaced by the ordering pass with a crossing from the same pass.
    Corrected,
    /// Midpoint estimate; no crossing was measured.
    Approximated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoonEvent {
    pub time: DateTime<Tz>,
    pub origin: EventOrigin,
}

impl MoonEvent {
    pub fn utc(&self) -> DateTime<Utc> {
        self.time.with_timezone(&Utc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ResolveStatus {
    Resolved,
    Unavailable(String),
}

/// Lunar events for one observer and local day. `None` means the event
/// does not occur in this pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoonEventSet {
    pub date: NaiveDate,
    pub rise: Option<MoonEvent>,
    pub ascent_45: Option<MoonEvent>,
    pub transit: Option<MoonEvent>,
    pub descent_45: Option<MoonEvent>,
    pub set: Option<MoonEvent>,
    /// Altitude at the selected transit, degrees.
    pub transit_altitude: Option<f64>,
    pub status: ResolveStatus,
}

impl MoonEventSet {
    /// Every event absent, with the reason the oracle could not answer.
    pub fn unavailable(date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            date,
            rise: None,
            ascent_45: None,
            transit: None,
            descent_45: None,
            set: None,
            transit_altitude: None,
            status: ResolveStatus::Unavailable(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }

    /// Events in pass order, with display names.
    pub fn events(&self) -> [(&'static str, Option<MoonEvent>); 5] {
        [
            ("Moonrise", self.rise),
            ("Ascent 45°", self.ascent_45),
            ("Transit", self.transit),
            ("Descent 45°", self.descent_45),
            ("Moonset", self.set),
        ]
    }
}

/// Current topocentric Moon position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoonSnapshot {
    pub instant: DateTime<Utc>,
    pub altitude: f64,
    pub azimuth: f64,
    pub distance_km: f64,
    pub distance_mi: f64,
    pub distance_au: f64,
    /// Illuminated fraction, [0, 1].
    pub illumination: f64,
}

pub fn snapshot(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    instant: DateTime<Utc>,
) -> Result<MoonSnapshot, EphemerisError> {
    let pos = oracle.observe(Body::Moon, observer, instant)?;
    Ok(MoonSnapshot {
        instant,
        altitude: pos.altitude,
        azimuth: pos.azimuth,
        distance_km: pos.distance_km,
        distance_mi: pos.distance_miles(),
        distance_au: pos.distance_km / AU_KM,
        illumination: oracle.illuminated_fraction(instant)?,
    })
}

fn altitude_fn<'a>(
    oracle: &'a dyn EphemerisOracle,
    observer: &'a Observer,
) -> impl Fn(DateTime<Utc>) -> SearchResult<f64> + 'a {
    move |t: DateTime<Utc>| -> SearchResult<f64> { Ok(oracle.observe(Body::Moon, observer, t)?.altitude) }
}

/// Every meridian crossing in the window. Upper transits are
/// [`Transition::Falling`] (the Moon stops being east of the meridian),
/// lower transits [`Transition::Rising`]. `value` is the altitude.
pub fn meridian_transits(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    window: &EventWindow,
) -> SearchResult<Vec<Candidate>> {
    search::find_transitions(
        window,
        Duration::minutes(COARSE_STEP_MINUTES),
        |t| Ok(oracle.observe(Body::Moon, observer, t)?.east_of_meridian()),
        altitude_fn(oracle, observer),
    )
}

/// Raw candidates per category, before selection.
struct Candidates {
    rising: Vec<Candidate>,
    setting: Vec<Candidate>,
    upper_transits: Vec<Candidate>,
    ascending_45: Vec<Candidate>,
    descending_45: Vec<Candidate>,
}

fn bisection_candidates(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    day: LocalDay,
) -> SearchResult<Candidates> {
    let step = Duration::minutes(COARSE_STEP_MINUTES);
    let altitude = altitude_fn(oracle, observer);

    let wide = EventWindow::around(day, Duration::days(HORIZON_MARGIN_DAYS));
    let horizon = search::find_threshold_crossings(&wide, step, MOON_HORIZON, &altitude)?;
    let meridian = meridian_transits(oracle, observer, &wide)?;

    let narrow = EventWindow::around(day, Duration::days(ASCENT_MARGIN_DAYS));
    let crossings_45 = search::find_threshold_crossings(&narrow, step, ASCENT_ALTITUDE, &altitude)?;

    Ok(Candidates {
        rising: search::with_transition(&horizon, Transition::Rising),
        setting: search::with_transition(&horizon, Transition::Falling),
        upper_transits: search::with_transition(&meridian, Transition::Falling),
        ascending_45: search::with_transition(&crossings_45, Transition::Rising),
        descending_45: search::with_transition(&crossings_45, Transition::Falling),
    })
}

/// Fill empty categories from a 5-minute altitude sampling of the day ± 2 days.
fn sampling_fallback(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    day: LocalDay,
    found: &mut Candidates,
) -> SearchResult<()> {
    if !(found.rising.is_empty()
        || found.setting.is_empty()
        || found.upper_transits.is_empty()
        || found.ascending_45.is_empty()
        || found.descending_45.is_empty())
    {
        return Ok(());
    }

    let window = EventWindow::around(day, Duration::days(FALLBACK_MARGIN_DAYS));
    let samples = search::sample(
        window.start,
        window.end,
        Duration::minutes(FALLBACK_STEP_MINUTES),
        altitude_fn(oracle, observer),
    )?;
    debug!("Moon sampling fallback over {} samples", samples.len());

    let horizon = search::interpolate_crossings(&samples, MOON_HORIZON);
    let crossings_45 = search::interpolate_crossings(&samples, ASCENT_ALTITUDE);
    let fills = [
        (&mut found.rising, search::with_transition(&horizon, Transition::Rising)),
        (&mut found.setting, search::with_transition(&horizon, Transition::Falling)),
        (&mut found.upper_transits, search::refine_peaks(&samples)),
        (&mut found.ascending_45, search::with_transition(&crossings_45, Transition::Rising)),
        (&mut found.descending_45, search::with_transition(&crossings_45, Transition::Falling)),
    ];
    for (slot, sampled) in fills {
        if slot.is_empty() {
            *slot = sampled;
        }
    }
    Ok(())
}

fn latest_in(candidates: &[Candidate], after: DateTime<Utc>, before: DateTime<Utc>) -> Option<Candidate> {
    candidates
        .iter()
        .filter(|c| c.instant > after && c.instant <= before)
        .max_by_key(|c| c.instant)
        .copied()
}

fn earliest_in(candidates: &[Candidate], after: DateTime<Utc>, before: DateTime<Utc>) -> Option<Candidate> {
    candidates
        .iter()
        .filter(|c| c.instant >= after && c.instant < before)
        .min_by_key(|c| c.instant)
        .copied()
}

fn midpoint(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a + Duration::milliseconds((b - a).num_milliseconds() / 2)
}

/// Keep `selected` when `valid`, else fall back to `corrected`.
fn reconcile(
    selected: Option<Candidate>,
    valid: impl Fn(DateTime<Utc>) -> bool,
    corrected: Option<Candidate>,
) -> Option<(DateTime<Utc>, EventOrigin)> {
    match selected {
        Some(c) if valid(c.instant) => Some((c.instant, EventOrigin::Measured)),
        _ => corrected.map(|c| {
            let origin = if selected.map(|s| s.instant) == Some(c.instant) {
                EventOrigin::Measured
            } else {
                EventOrigin::Corrected
            };
            (c.instant, origin)
        }),
    }
}

/// Selection plus the ordering pass.
fn assemble(observer: &Observer, day: LocalDay, found: &Candidates) -> MoonEventSet {
    let rise = search::choose_best(&found.rising, &day);
    let set = search::choose_best(&found.setting, &day);
    let transit = search::choose_highest(&found.upper_transits, &day);
    let ascent = search::choose_best(&found.ascending_45, &day);
    let descent = search::choose_best(&found.descending_45, &day);

    let event = |pair: Option<(DateTime<Utc>, EventOrigin)>| {
        pair.map(|(t, origin)| MoonEvent {
            time: observer.to_local(t),
            origin,
        })
    };

    let Some(transit) = transit else {
        // No anchor: categories stand as selected.
        let measured = |c: Option<Candidate>| event(c.map(|c| (c.instant, EventOrigin::Measured)));
        return MoonEventSet {
            date: day.date,
            rise: measured(rise),
            ascent_45: None,
            transit: None,
            descent_45: None,
            set: measured(set),
            transit_altitude: None,
            status: ResolveStatus::Resolved,
        };
    };

    let t = transit.instant;
    let one_day = Duration::days(1);
    let half_pass = Duration::hours(13);

    let rise = reconcile(
        rise,
        |r| r <= t && t - r < one_day,
        latest_in(&found.rising, t - one_day, t),
    );
    let set = reconcile(
        set,
        |s| s >= t && s - t < one_day,
        earliest_in(&found.setting, t, t + one_day),
    );

    // Without a measured crossing, the 45° events fall back to the midpoint
    // of their half of the pass. This includes passes that culminate below 45°.
    let after = rise.map_or(t - half_pass, |(r, _)| r);
    let ascent_45 = reconcile(ascent, |a| a > after && a < t, latest_in(&found.ascending_45, after, t))
        .or_else(|| rise.map(|(r, _)| (midpoint(r, t), EventOrigin::Approximated)));

    let before = set.map_or(t + half_pass, |(s, _)| s);
    let descent_45 = reconcile(descent, |d| d > t && d < before, earliest_in(&found.descending_45, t, before))
        .or_else(|| set.map(|(s, _)| (midpoint(t, s), EventOrigin::Approximated)));

    MoonEventSet {
        date: day.date,
        rise: event(rise),
        ascent_45: event(ascent_45),
        transit: event(Some((t, EventOrigin::Measured))),
        descent_45: event(descent_45),
        set: event(set),
        transit_altitude: Some(transit.value),
        status: ResolveStatus::Resolved,
    }
}

/// Resolve the lunar pass for `date`, propagating oracle failures.
pub fn try_resolve(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    date: NaiveDate,
) -> SearchResult<MoonEventSet> {
    let day = observer.local_day(date);
    let mut found = bisection_candidates(oracle, observer, day)?;
    sampling_fallback(oracle, observer, day, &mut found)?;
    Ok(assemble(observer, day, &found))
}

/// Resolve the lunar pass for `date`. Oracle failure yields an explicit
/// unavailable set instead of an error.
pub fn resolve(oracle: &dyn EphemerisOracle, observer: &Observer, date: NaiveDate) -> MoonEventSet {
    match try_resolve(oracle, observer, date) {
        Ok(set) => set,
        Err(e) => {
            warn!("Moon events unavailable for {}: {}", date, e);
            MoonEventSet::unavailable(date, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::AnalyticalEphemeris;
    use approx::assert_abs_diff_eq;

    fn observer(lat: f64, lon: f64, tz: &str) -> Observer {
        Observer::with_zone_name(lat, lon, tz).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cases() -> Vec<(Observer, NaiveDate)> {
        vec![
            (observer(28.6139, 77.2090, "Asia/Kolkata"), date(2024, 3, 20)),
            (observer(28.6139, 77.2090, "Asia/Kolkata"), date(2024, 4, 8)),
            (observer(21.4225, 39.8262, "Asia/Riyadh"), date(2026, 2, 18)),
            (observer(51.5074, -0.1278, "Europe/London"), date(2024, 12, 21)),
            (observer(40.7128, -74.0060, "America/New_York"), date(2024, 7, 4)),
            (observer(-33.8688, 151.2093, "Australia/Sydney"), date(2025, 1, 15)),
            (observer(-1.2921, 36.8219, "Africa/Nairobi"), date(2024, 10, 2)),
            (observer(35.6762, 139.6503, "Asia/Tokyo"), date(2025, 5, 12)),
            (observer(59.3293, 18.0686, "Europe/Stockholm"), date(2024, 6, 21)),
            (observer(65.0, 25.47, "Europe/Helsinki"), date(2024, 12, 15)),
            (observer(65.0, 25.47, "Europe/Helsinki"), date(2025, 6, 10)),
            (observer(-54.8019, -68.3030, "America/Argentina/Ushuaia"), date(2024, 9, 1)),
        ]
    }

    fn assert_ordered(set: &MoonEventSet) {
        let times: Vec<DateTime<Utc>> = set
            .events()
            .iter()
            .filter_map(|(_, e)| e.map(|e| e.utc()))
            .collect();
        for w in times.windows(2) {
            assert!(w[0] <= w[1], "{}: {} > {}", set.date, w[0], w[1]);
        }
    }

    #[test]
    fn test_ordering_invariant() {
        let eph = AnalyticalEphemeris::new();
        for (obs, day) in cases() {
            let set = resolve(&eph, &obs, day);
            assert!(set.is_available());
            assert!(set.transit.is_some(), "{:?} {}: no transit", obs.tz, day);
            assert_ordered(&set);
        }
    }

    #[test]
    fn test_rise_and_set_refined_to_horizon() {
        let eph = AnalyticalEphemeris::new();
        let obs = observer(28.6139, 77.2090, "Asia/Kolkata");
        let set = resolve(&eph, &obs, date(2024, 3, 20));
        for event in [set.rise, set.set] {
            let event = event.unwrap();
            let alt = eph.observe(Body::Moon, &obs, event.utc()).unwrap().altitude;
            assert_abs_diff_eq!(alt, MOON_HORIZON, epsilon = 0.01);
        }
    }

    #[test]
    fn test_transit_on_meridian() {
        let eph = AnalyticalEphemeris::new();
        let obs = observer(51.5074, -0.1278, "Europe/London");
        let set = resolve(&eph, &obs, date(2024, 12, 21));
        let transit = set.transit.unwrap();
        let pos = eph.observe(Body::Moon, &obs, transit.utc()).unwrap();
        assert!(pos.hour_angle.abs() < 0.05, "hour angle {}", pos.hour_angle);
        assert_abs_diff_eq!(pos.altitude, set.transit_altitude.unwrap(), epsilon = 0.01);
        // Upper transit from London is due south.
        assert_abs_diff_eq!(pos.azimuth, 180.0, epsilon = 0.5);
    }

    #[test]
    fn test_ascent_crosses_45() {
        let eph = AnalyticalEphemeris::new();
        // Near the equator the Moon always transits above 45°.
        let obs = observer(-1.2921, 36.8219, "Africa/Nairobi");
        let set = resolve(&eph, &obs, date(2024, 10, 2));
        assert!(set.transit_altitude.unwrap() > 45.0);
        for event in [set.ascent_45, set.descent_45] {
            let event = event.unwrap();
            if event.origin != EventOrigin::Approximated {
                let alt = eph.observe(Body::Moon, &obs, event.utc()).unwrap().altitude;
                assert_abs_diff_eq!(alt, ASCENT_ALTITUDE, epsilon = 0.01);
            }
        }
    }

    #[test]
    fn test_low_moon_gets_approximated_45_events() {
        let eph = AnalyticalEphemeris::new();
        let obs = observer(65.0, 25.47, "Europe/Helsinki");
        let mut low_passes = 0;
        for day in [date(2024, 12, 15), date(2025, 6, 10)] {
            let set = resolve(&eph, &obs, day);
            if set.transit_altitude.unwrap() >= ASCENT_ALTITUDE {
                continue;
            }
            low_passes += 1;
            let t = set.transit.unwrap().utc();
            if let Some(rise) = set.rise {
                let ascent = set.ascent_45.unwrap();
                assert_eq!(ascent.origin, EventOrigin::Approximated);
                assert_eq!(ascent.utc(), midpoint(rise.utc(), t));
            }
            if let Some(moonset) = set.set {
                let descent = set.descent_45.unwrap();
                assert_eq!(descent.origin, EventOrigin::Approximated);
                assert_eq!(descent.utc(), midpoint(t, moonset.utc()));
            }
            assert_ordered(&set);
        }
        assert!(low_passes > 0);
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn candidate(instant: &str, transition: Transition, value: f64) -> Candidate {
        Candidate {
            instant: utc(instant),
            transition,
            value,
        }
    }

    fn rising(instants: &[&str]) -> Vec<Candidate> {
        instants.iter().map(|t| candidate(t, Transition::Rising, MOON_HORIZON)).collect()
    }

    fn setting(instants: &[&str]) -> Vec<Candidate> {
        instants.iter().map(|t| candidate(t, Transition::Falling, MOON_HORIZON)).collect()
    }

    fn transit_at(instant: &str, altitude: f64) -> Vec<Candidate> {
        vec![candidate(instant, Transition::Falling, altitude)]
    }

    #[test]
    fn test_rise_and_set_corrected_around_transit() {
        let obs = observer(0.0, 0.0, "UTC");
        let day = obs.local_day(date(2024, 3, 20));
        let found = Candidates {
            // The in-day rise comes after the transit and the in-day set before it.
            rising: rising(&["2024-03-19T20:00:00Z", "2024-03-20T18:00:00Z"]),
            setting: setting(&["2024-03-20T06:00:00Z", "2024-03-21T02:00:00Z"]),
            upper_transits: transit_at("2024-03-20T12:00:00Z", 60.0),
            ascending_45: vec![candidate("2024-03-20T09:00:00Z", Transition::Rising, ASCENT_ALTITUDE)],
            descending_45: vec![candidate("2024-03-20T15:00:00Z", Transition::Falling, ASCENT_ALTITUDE)],
        };
        let set = assemble(&obs, day, &found);
        let t = utc("2024-03-20T12:00:00Z");

        let rise = set.rise.unwrap();
        assert_eq!(rise.utc(), utc("2024-03-19T20:00:00Z"));
        assert_eq!(rise.origin, EventOrigin::Corrected);
        assert!(t - rise.utc() < Duration::days(1));

        let moonset = set.set.unwrap();
        assert_eq!(moonset.utc(), utc("2024-03-21T02:00:00Z"));
        assert_eq!(moonset.origin, EventOrigin::Corrected);
        assert!(moonset.utc() - t < Duration::days(1));

        assert_eq!(set.ascent_45.unwrap().origin, EventOrigin::Measured);
        assert_eq!(set.descent_45.unwrap().origin, EventOrigin::Measured);
        assert_eq!(set.transit.unwrap().origin, EventOrigin::Measured);
        assert_eq!(set.transit_altitude, Some(60.0));
        assert_ordered(&set);
    }

    #[test]
    fn test_correction_ignores_crossings_beyond_one_day() {
        let obs = observer(0.0, 0.0, "UTC");
        let day = obs.local_day(date(2024, 3, 20));
        let found = Candidates {
            rising: rising(&["2024-03-19T08:00:00Z", "2024-03-20T18:00:00Z"]),
            setting: setting(&["2024-03-20T06:00:00Z", "2024-03-21T14:00:00Z"]),
            upper_transits: transit_at("2024-03-20T12:00:00Z", 60.0),
            ascending_45: Vec::new(),
            descending_45: Vec::new(),
        };
        let set = assemble(&obs, day, &found);
        assert!(set.rise.is_none());
        assert!(set.set.is_none());
        // No rise or set to halve against.
        assert!(set.ascent_45.is_none());
        assert!(set.descent_45.is_none());
        assert!(set.transit.is_some());
    }

    #[test]
    fn test_45_events_approximated_without_crossings() {
        let obs = observer(0.0, 0.0, "UTC");
        let day = obs.local_day(date(2024, 3, 20));
        let found = Candidates {
            rising: rising(&["2024-03-20T06:00:00Z"]),
            setting: setting(&["2024-03-20T18:00:00Z"]),
            upper_transits: transit_at("2024-03-20T12:00:00Z", 30.0),
            ascending_45: Vec::new(),
            descending_45: Vec::new(),
        };
        let set = assemble(&obs, day, &found);
        assert_eq!(set.rise.unwrap().origin, EventOrigin::Measured);
        assert_eq!(set.set.unwrap().origin, EventOrigin::Measured);

        let ascent = set.ascent_45.unwrap();
        assert_eq!(ascent.utc(), utc("2024-03-20T09:00:00Z"));
        assert_eq!(ascent.origin, EventOrigin::Approximated);
        let descent = set.descent_45.unwrap();
        assert_eq!(descent.utc(), utc("2024-03-20T15:00:00Z"));
        assert_eq!(descent.origin, EventOrigin::Approximated);
        assert_ordered(&set);
    }

    #[test]
    fn test_misplaced_45_crossing_replaced_from_same_pass() {
        let obs = observer(0.0, 0.0, "UTC");
        let day = obs.local_day(date(2024, 3, 20));
        let found = Candidates {
            rising: rising(&["2024-03-20T06:00:00Z"]),
            setting: setting(&["2024-03-20T18:00:00Z"]),
            upper_transits: transit_at("2024-03-20T12:00:00Z", 70.0),
            // The first in-day ascent belongs to the previous pass.
            ascending_45: vec![
                candidate("2024-03-20T02:00:00Z", Transition::Rising, ASCENT_ALTITUDE),
                candidate("2024-03-20T08:30:00Z", Transition::Rising, ASCENT_ALTITUDE),
            ],
            descending_45: vec![candidate("2024-03-20T15:30:00Z", Transition::Falling, ASCENT_ALTITUDE)],
        };
        let set = assemble(&obs, day, &found);
        let ascent = set.ascent_45.unwrap();
        assert_eq!(ascent.utc(), utc("2024-03-20T08:30:00Z"));
        assert_eq!(ascent.origin, EventOrigin::Corrected);
        assert_eq!(set.descent_45.unwrap().origin, EventOrigin::Measured);
        assert_ordered(&set);
    }

    #[test]
    fn test_unavailable_oracle_yields_empty_set() {
        let eph = AnalyticalEphemeris::new();
        let obs = observer(28.6139, 77.2090, "Asia/Kolkata");
        let set = resolve(&eph, &obs, date(2300, 1, 1));
        assert!(!set.is_available());
        assert!(set.events().iter().all(|(_, e)| e.is_none()));
        assert!(matches!(set.status, ResolveStatus::Unavailable(ref r) if r.contains("outside")));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let eph = AnalyticalEphemeris::new();
        let obs = observer(35.6762, 139.6503, "Asia/Tokyo");
        assert_eq!(resolve(&eph, &obs, date(2025, 5, 12)), resolve(&eph, &obs, date(2025, 5, 12)));
    }

    #[test]
    fn test_snapshot_fields() {
        let eph = AnalyticalEphemeris::new();
        let obs = observer(21.4225, 39.8262, "Asia/Riyadh");
        let now: DateTime<Utc> = "2024-04-23T23:49:00Z".parse().unwrap();
        let snap = snapshot(&eph, &obs, now).unwrap();
        assert!(snap.illumination > 0.99);
        assert!((0.0..360.0).contains(&snap.azimuth));
        assert_abs_diff_eq!(snap.distance_mi, snap.distance_km / 1.609344, epsilon = 5.0);
    }
}
