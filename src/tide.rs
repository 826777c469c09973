//! Theoretical inland tide.
//!
//! Treats every lunar meridian transit (upper and lower) as high water and
//! the midpoint between consecutive transits as low water. This is a
//! labelled heuristic for orientation only; it ignores the Sun, basin
//! geometry and every local effect that real tide tables account for.

use crate::ephemeris::EphemerisOracle;
use crate::moon;
use crate::observer::Observer;
use crate::search::{EventWindow, SearchResult};
use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

pub const MODEL: &str = "heuristic";
pub const DISCLAIMER: &str =
    "Theoretical tide from lunar meridian transits only. Not a tide prediction; do not use for navigation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TideKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TideEvent {
    pub kind: TideKind,
    pub time: DateTime<Tz>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TideTable {
    pub date: NaiveDate,
    pub model: &'static str,
    pub disclaimer: &'static str,
    pub events: Vec<TideEvent>,
}

impl TideTable {
    pub fn count(&self, kind: TideKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

pub fn theoretical_inland_tide(
    oracle: &dyn EphemerisOracle,
    observer: &Observer,
    date: NaiveDate,
) -> SearchResult<TideTable> {
    let day = observer.local_day(date);
    let window = EventWindow::around(day, Duration::days(1));
    let transits = moon::meridian_transits(oracle, observer, &window)?;

    let highs = transits.iter().map(|c| (TideKind::High, c.instant));
    let lows = transits.windows(2).map(|w| {
        let gap = (w[1].instant - w[0].instant).num_milliseconds() / 2;
        (TideKind::Low, w[0].instant + Duration::milliseconds(gap))
    });

    let mut events: Vec<TideEvent> = highs
        .chain(lows)
        .filter(|(_, t)| day.contains(*t))
        .map(|(kind, t)| TideEvent {
            kind,
            time: observer.to_local(t),
        })
        .collect();
    events.sort_by_key(|e| e.time);

    let table = TideTable {
        date,
        model: MODEL,
        disclaimer: DISCLAIMER,
        events,
    };
    log::debug!(
        "Tide heuristic for {}: {} high, {} low",
        date,
        table.count(TideKind::High),
        table.count(TideKind::Low)
    );
    Ok(table)
}
