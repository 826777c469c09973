//! Lunar phases.
//!
//! Principal phases are the quadrant boundaries of the Moon–Sun ecliptic
//! longitude difference; the intermediate ones are the instants the
//! illuminated fraction crosses 25 % and 75 %.

use crate::ephemeris::EphemerisOracle;
use crate::observer::Observer;
use crate::search::{self, EventWindow, SearchResult, StateChange, Transition};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

const QUADRANT_STEP_HOURS: i64 = 6;
const ILLUMINATION_STEP_HOURS: i64 = 1;
/// Longer than one synodic month (29.53 d).
const LUNATION_SEARCH_DAYS: i64 = 31;

pub const CRESCENT_THRESHOLD: f64 = 0.25;
pub const GIBBOUS_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseName {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseName {
    /// Phase starting at a quadrant boundary (0 = New … 3 = Last Quarter).
    pub fn from_quadrant(quadrant: u8) -> Self {
        match quadrant % 4 {
            0 => PhaseName::NewMoon,
            1 => PhaseName::FirstQuarter,
            2 => PhaseName::FullMoon,
            _ => PhaseName::LastQuarter,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseName::NewMoon => "New Moon",
            PhaseName::WaxingCrescent => "Waxing Crescent",
            PhaseName::FirstQuarter => "First Quarter",
            PhaseName::WaxingGibbous => "Waxing Gibbous",
            PhaseName::FullMoon => "Full Moon",
            PhaseName::WaningGibbous => "Waning Gibbous",
            PhaseName::LastQuarter => "Last Quarter",
            PhaseName::WaningCrescent => "Waning Crescent",
        }
    }

    /// Name for a disc with illuminated fraction `fraction`.
    pub fn classify(fraction: f64, waxing: bool) -> Self {
        match (fraction, waxing) {
            (f, _) if f < 0.02 => PhaseName::NewMoon,
            (f, true) if f <= 0.49 => PhaseName::WaxingCrescent,
            (f, false) if f <= 0.49 => PhaseName::WaningCrescent,
            (f, true) if f < 0.51 => PhaseName::FirstQuarter,
            (f, false) if f < 0.51 => PhaseName::LastQuarter,
            (f, true) if f <= 0.99 => PhaseName::WaxingGibbous,
            (f, false) if f <= 0.99 => PhaseName::WaningGibbous,
            _ => PhaseName::FullMoon,
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseEvent {
    pub name: PhaseName,
    pub time: DateTime<Tz>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPhase {
    pub date: NaiveDate,
    pub name: PhaseName,
    pub illumination: f64,
}

/// Upcoming phases as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseOutlook {
    pub next_new: Option<PhaseEvent>,
    pub next_full: Option<PhaseEvent>,
    /// Eight events starting at the next New Moon.
    pub lunation: Vec<PhaseEvent>,
    pub daily: Vec<DailyPhase>,
}

fn quadrant(oracle: &dyn EphemerisOracle, t: DateTime<Utc>) -> SearchResult<u8> {
    Ok((oracle.phase_angle(t)? / 90.0).floor() as u8 % 4)
}

/// Quadrant boundaries in `[start, end]`.
pub fn quadrant_changes(
    oracle: &dyn EphemerisOracle,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SearchResult<Vec<StateChange<u8>>> {
    search::find_discrete(start, end, Duration::hours(QUADRANT_STEP_HOURS), |t| {
        quadrant(oracle, t)
    })
}

/// New, First Quarter, Full and Last Quarter instants in `[start, end]`.
pub fn principal_phases(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SearchResult<Vec<PhaseEvent>> {
    Ok(quadrant_changes(oracle, start, end)?
        .into_iter()
        .map(|c| PhaseEvent {
            name: PhaseName::from_quadrant(c.to),
            time: observer.to_local(c.instant),
        })
        .collect())
}

/// The first `name` phase after `after`, within one lunation.
pub fn next_phase(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    after: DateTime<Utc>,
    name: PhaseName,
) -> SearchResult<Option<PhaseEvent>> {
    let end = after + Duration::days(LUNATION_SEARCH_DAYS);
    Ok(principal_phases(oracle, observer, after, end)?
        .into_iter()
        .find(|p| p.name == name))
}

/// Illumination threshold crossings in `[start, end]`, named.
fn intermediate_phases(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SearchResult<Vec<PhaseEvent>> {
    let window = EventWindow::between(start, end, observer.day_of(start));
    let step = Duration::hours(ILLUMINATION_STEP_HOURS);
    let illumination = |t| oracle.illuminated_fraction(t);

    let mut events = Vec::new();
    for (threshold, waxing, waning) in [
        (CRESCENT_THRESHOLD, PhaseName::WaxingCrescent, PhaseName::WaningCrescent),
        (GIBBOUS_THRESHOLD, PhaseName::WaxingGibbous, PhaseName::WaningGibbous),
    ] {
        for c in search::find_threshold_crossings(&window, step, threshold, illumination)? {
            events.push(PhaseEvent {
                name: match c.transition {
                    Transition::Rising => waxing,
                    Transition::Falling => waning,
                },
                time: observer.to_local(c.instant),
            });
        }
    }
    Ok(events)
}

/// All eight phases of the lunation starting at the next New Moon after `after`.
pub fn upcoming_lunation(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    after: DateTime<Utc>,
) -> SearchResult<Vec<PhaseEvent>> {
    let Some(new_moon) = next_phase(oracle, observer, after, PhaseName::NewMoon)? else {
        return Ok(Vec::new());
    };
    let start = new_moon.time.with_timezone(&Utc);
    let following = next_phase(oracle, observer, start + Duration::days(1), PhaseName::NewMoon)?;
    let end = following.map_or(start + Duration::days(LUNATION_SEARCH_DAYS), |p| {
        p.time.with_timezone(&Utc)
    });

    let mut events = principal_phases(oracle, observer, start - Duration::hours(1), end - Duration::hours(1))?;
    events.extend(intermediate_phases(oracle, observer, start, end)?);
    events.sort_by_key(|p| p.time);
    Ok(events)
}

/// One phase name per local day, sampled at local noon.
pub fn daily_phase_names(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    first: NaiveDate,
    days: u32,
) -> SearchResult<Vec<DailyPhase>> {
    let half_day = Duration::hours(12);
    first
        .iter_days()
        .take(days as usize)
        .map(|date| {
            let noon = observer.local_day(date).noon();
            let illumination = oracle.illuminated_fraction(noon)?;
            let waxing = oracle.illuminated_fraction(noon + half_day)?
                > oracle.illuminated_fraction(noon - half_day)?;
            Ok(DailyPhase {
                date,
                name: PhaseName::classify(illumination, waxing),
                illumination,
            })
        })
        .collect()
}

/// Next New and Full Moon, the upcoming lunation and a week of daily names.
pub fn outlook(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    now: DateTime<Utc>,
) -> SearchResult<PhaseOutlook> {
    Ok(PhaseOutlook {
        next_new: next_phase(oracle, observer, now, PhaseName::NewMoon)?,
        next_full: next_phase(oracle, observer, now, PhaseName::FullMoon)?,
        lunation: upcoming_lunation(oracle, observer, now)?,
        daily: daily_phase_names(oracle, observer, observer.day_of(now).date, 7)?,
    })
}
