//! Report assembly and text rendering.
//!
//! The prayer schedule is always present. Every part that depends on the
//! ephemeris oracle degrades on its own to `Unavailable { reason }`.

use crate::ephemeris::{Body, EphemerisOracle};
use crate::error::EphemerisError;
use crate::geo::{self, CityDistance, Gazetteer, SubPointSummary};
use crate::location::ResolvedLocation;
use crate::moon::{self, EventOrigin, MoonEvent, MoonEventSet, MoonSnapshot};
use crate::observer::Observer;
use crate::phase::{self, PhaseOutlook};
use crate::schedule::{self, DayState, PrayerConfig, PrayerSchedule};
use crate::tide::{self, TideKind, TideTable};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

const TIME_FORMAT: &str = "%H:%M:%S";
const DOES_NOT_OCCUR: &str = "Does not occur today";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Section<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Section<T> {
    pub fn from_result(result: Result<T, EphemerisError>) -> Self {
        match result {
            Ok(value) => Section::Available(value),
            Err(e) => {
                log::warn!("Report section unavailable: {}", e);
                Section::Unavailable { reason: e.to_string() }
            }
        }
    }

    pub fn unavailable(reason: &EphemerisError) -> Self {
        Section::Unavailable {
            reason: reason.to_string(),
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Section::Available(value) => Some(value),
            Section::Unavailable { .. } => None,
        }
    }
}

/// Lunar parts of the report. Each one degrades independently: a phase
/// search that runs past the ephemeris coverage leaves the day's events intact.
#[derive(Debug, Clone, Serialize)]
pub struct MoonReport {
    pub events: Section<MoonEventSet>,
    pub now: Section<MoonSnapshot>,
    pub phases: Section<PhaseOutlook>,
}

impl MoonReport {
    fn build(oracle: &dyn EphemerisOracle, observer: &Observer, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            events: Section::from_result(moon::try_resolve(oracle, observer, date)),
            now: Section::from_result(moon::snapshot(oracle, observer, now)),
            phases: Section::from_result(phase::outlook(oracle, observer, now)),
        }
    }

    fn unavailable(reason: &EphemerisError) -> Self {
        Self {
            events: Section::unavailable(reason),
            now: Section::unavailable(reason),
            phases: Section::unavailable(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Tz>,
    pub location: ResolvedLocation,
    pub prayer: PrayerSchedule,
    pub moon: MoonReport,
    pub tide: Section<TideTable>,
    pub sub_points: Section<Vec<SubPointSummary>>,
}

impl Report {
    /// Build every section for `date` (events) and `now` (snapshots).
    pub fn build(
        location: &ResolvedLocation,
        observer: &Observer,
        config: &PrayerConfig,
        date: NaiveDate,
        now: DateTime<Utc>,
        oracle: Result<&dyn EphemerisOracle, &EphemerisError>,
    ) -> Self {
        let prayer = schedule::compute_schedule(observer, config, date);

        let (moon, tide, sub_points) = match oracle {
            Ok(oracle) => (
                MoonReport::build(oracle, observer, date, now),
                Section::from_result(tide::theoretical_inland_tide(oracle, observer, date)),
                Section::from_result(sub_points(oracle, now)),
            ),
            Err(e) => {
                log::warn!("Ephemeris unavailable; lunar sections skipped: {}", e);
                (MoonReport::unavailable(e), Section::unavailable(e), Section::unavailable(e))
            }
        };

        Report {
            generated_at: observer.to_local(now),
            location: location.clone(),
            prayer,
            moon,
            tide,
            sub_points,
        }
    }
}

fn sub_points(oracle: &dyn EphemerisOracle, now: DateTime<Utc>) -> Result<Vec<SubPointSummary>, EphemerisError> {
    let gazetteer = Gazetteer::builtin();
    [Body::Sun, Body::Moon]
        .into_iter()
        .map(|body| geo::sub_point_summary(oracle, &gazetteer, body, now))
        .collect()
}

// ─── Text rendering ─────────────────────────────────────────────

fn time_or_absent(t: Option<DateTime<Tz>>) -> String {
    t.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| DOES_NOT_OCCUR.to_string())
}

fn moon_event_line(name: &str, event: Option<MoonEvent>) -> String {
    match event {
        None => format!("    {:<12} {}", name, DOES_NOT_OCCUR),
        Some(e) => {
            let tag = match e.origin {
                EventOrigin::Measured => "",
                EventOrigin::Corrected => " [corrected]",
                EventOrigin::Approximated => " [approximated]",
            };
            format!("    {:<12} {}{}", name, e.time.format(TIME_FORMAT), tag)
        }
    }
}

fn city_line(label: &str, city: &CityDistance) -> String {
    format!(
        "      {:<10} {}, {} ({:.0} km, influence {:.1})",
        label, city.name, city.country, city.distance_km, city.influence
    )
}

/// Writes the body of an available section, or its reason.
fn write_section<T>(
    f: &mut fmt::Formatter<'_>,
    section: &Section<T>,
    body: impl FnOnce(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    match section {
        Section::Available(value) => body(f, value),
        Section::Unavailable { reason } => writeln!(f, "    Unavailable: {}", reason),
    }
}

fn write_prayer(f: &mut fmt::Formatter<'_>, p: &PrayerSchedule) -> fmt::Result {
    write!(
        f,
        "  Prayer times {} ({}, Fajr {}°, Isha {}°)",
        p.date, p.config.madhab, p.config.fajr_angle, p.config.isha_angle
    )?;
    if p.state != DayState::Normal {
        write!(f, " [{}]", p.state)?;
    }
    writeln!(f)?;
    for (name, time) in p.prayers() {
        writeln!(f, "    {:<12} {}", name, time_or_absent(time))?;
    }
    for (label, civil, nautical, astronomical) in [
        ("Dawn", p.dawn_civil, p.dawn_nautical, p.dawn_astronomical),
        ("Dusk", p.dusk_civil, p.dusk_nautical, p.dusk_astronomical),
    ] {
        writeln!(
            f,
            "    {:<12} civil {} / nautical {} / astronomical {}",
            label,
            time_or_absent(civil),
            time_or_absent(nautical),
            time_or_absent(astronomical)
        )?;
    }
    if let Some(len) = p.day_length() {
        writeln!(f, "    {:<12} {}h {:02}m", "Day length", len.num_hours(), len.num_minutes() % 60)?;
    }
    Ok(())
}

fn write_moon(f: &mut fmt::Formatter<'_>, moon: &MoonReport) -> fmt::Result {
    writeln!(f, "  Moon")?;
    write_section(f, &moon.events, |f, events| {
        for (name, event) in events.events() {
            writeln!(f, "{}", moon_event_line(name, event))?;
        }
        if let Some(alt) = events.transit_altitude {
            writeln!(f, "    {:<12} {:.1}°", "Transit alt", alt)?;
        }
        Ok(())
    })?;

    writeln!(f, "  Moon now")?;
    write_section(f, &moon.now, |f, now| {
        writeln!(
            f,
            "    altitude {:.1}°, azimuth {:.1}°, {:.0} km ({:.0} mi), {:.0}% illuminated",
            now.altitude,
            now.azimuth,
            now.distance_km,
            now.distance_mi,
            now.illumination * 100.0
        )
    })?;

    writeln!(f, "  Phases")?;
    write_section(f, &moon.phases, |f, phases| {
        for e in phases.next_new.iter().chain(phases.next_full.iter()) {
            writeln!(f, "    Next {:<15} {}", e.name.label(), e.time.format("%Y-%m-%d %H:%M"))?;
        }
        if !phases.lunation.is_empty() {
            writeln!(f, "    Upcoming lunation:")?;
            for e in &phases.lunation {
                writeln!(f, "      {:<16} {}", e.name.label(), e.time.format("%Y-%m-%d %H:%M"))?;
            }
        }
        for d in &phases.daily {
            writeln!(f, "    {}  {} ({:.0}%)", d.date, d.name.label(), d.illumination * 100.0)?;
        }
        Ok(())
    })
}

fn write_tide(f: &mut fmt::Formatter<'_>, tide: &Section<TideTable>) -> fmt::Result {
    writeln!(f, "  Tide ({} model)", tide::MODEL)?;
    write_section(f, tide, |f, t| {
        writeln!(f, "    {}", t.disclaimer)?;
        for e in &t.events {
            let kind = match e.kind {
                TideKind::High => "High",
                TideKind::Low => "Low",
            };
            writeln!(f, "    {:<12} {}", kind, e.time.format(TIME_FORMAT))?;
        }
        Ok(())
    })
}

fn write_sub_points(f: &mut fmt::Formatter<'_>, sub_points: &Section<Vec<SubPointSummary>>) -> fmt::Result {
    writeln!(f, "  Sub-points")?;
    write_section(f, sub_points, |f, points| {
        for s in points {
            write!(f, "    {:<5} {:.4}, {:.4}", s.body, s.point.latitude, s.point.longitude)?;
            if let Some(t) = s.local_time {
                write!(f, " (local {})", t.format("%H:%M %Z"))?;
            }
            writeln!(f)?;
            if let Some(n) = &s.neighbourhood {
                writeln!(f, "{}", city_line("nearest", &n.nearest))?;
                if let Some(c) = &n.influential_north {
                    writeln!(f, "{}", city_line("north", c))?;
                }
                if let Some(c) = &n.influential_south {
                    writeln!(f, "{}", city_line("south", c))?;
                }
            }
        }
        Ok(())
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.location.display_line())?;
        writeln!(f, "  Generated {}", self.generated_at.format("%Y-%m-%d %H:%M:%S %Z"))?;
        writeln!(f)?;
        write_prayer(f, &self.prayer)?;
        writeln!(f)?;
        write_moon(f, &self.moon)?;
        writeln!(f)?;
        write_tide(f, &self.tide)?;
        writeln!(f)?;
        write_sub_points(f, &self.sub_points)
    }
}

pub fn render_text(report: &Report) -> String {
    report.to_string()
}
