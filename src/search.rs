//! Discrete-event search over continuous functions of time.
//!
//! Two modes share one candidate type:
//!
//! - **Discrete**: step a state function (bool, quadrant index, …) across a
//!   window at a coarse step and bisect every interval where the state
//!   changes, down to [`REFINE_TOLERANCE_MS`].
//! - **Sampling**: evaluate a real-valued signal at a fixed step, linearly
//!   interpolate threshold crossings and refine maxima with a 3-point parabola.
//!
//! Selection ([`choose_best`], [`choose_highest`]) then picks one candidate
//! per event category for a local calendar day. Every function here is a
//! pure function of its inputs.

use crate::error::EphemerisError;
use crate::observer::LocalDay;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Bisection stops once the bracket is narrower than this.
pub const REFINE_TOLERANCE_MS: i64 = 1_000;

/// Upper bound on bisection steps; 40 halvings of a 30-day step is sub-ms.
const MAX_BISECT_ITER: u32 = 40;

pub type SearchResult<T> = Result<T, EphemerisError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    Rising,
    Falling,
}

/// A raw event found by a search, before selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub instant: DateTime<Utc>,
    pub transition: Transition,
    /// Signal value at the candidate (altitude for transits).
    pub value: f64,
}

/// A change of a discrete state, refined to the bisection tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateChange<S> {
    pub instant: DateTime<Utc>,
    pub from: S,
    pub to: S,
}

/// Search interval `[start, end)` plus the local day used for selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub day: LocalDay,
}

impl EventWindow {
    /// The target day widened by `margin` on both sides.
    pub fn around(day: LocalDay, margin: Duration) -> Self {
        Self {
            start: day.start - margin,
            end: day.end + margin,
            day,
        }
    }

    /// An explicit interval; the day is kept for selection only.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>, day: LocalDay) -> Self {
        Self { start, end, day }
    }
}

/// One evaluation of a real-valued signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub instant: DateTime<Utc>,
    pub value: f64,
}

fn midpoint(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    a + Duration::milliseconds((b - a).num_milliseconds() / 2)
}

/// Bisect `(lo, hi]` where `state(lo) == from` and the state at `hi` differs.
/// Returns the refined instant and the state just after the change.
fn bisect_change<S, F>(
    mut lo: DateTime<Utc>,
    from: S,
    mut hi: DateTime<Utc>,
    mut to: S,
    state: &F,
) -> SearchResult<(DateTime<Utc>, S)>
where
    S: Copy + PartialEq,
    F: Fn(DateTime<Utc>) -> SearchResult<S>,
{
    for _ in 0..MAX_BISECT_ITER {
        if (hi - lo).num_milliseconds() <= REFINE_TOLERANCE_MS {
            break;
        }
        let mid = midpoint(lo, hi);
        let s_mid = state(mid)?;
        if s_mid == from {
            lo = mid;
        } else {
            hi = mid;
            to = s_mid;
        }
    }
    Ok((midpoint(lo, hi), to))
}

/// Every change of `state` in `[start, end]`, in time order.
///
/// Changes closer together than `step` may be merged or missed; pick the
/// step below the shortest interval between events.
pub fn find_discrete<S, F>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    state: F,
) -> SearchResult<Vec<StateChange<S>>>
where
    S: Copy + PartialEq,
    F: Fn(DateTime<Utc>) -> SearchResult<S>,
{
    let mut changes = Vec::new();
    if end <= start || step <= Duration::zero() {
        return Ok(changes);
    }

    let mut t0 = start;
    let mut s0 = state(t0)?;
    while t0 < end {
        let t1 = std::cmp::min(t0 + step, end);
        let s1 = state(t1)?;
        if s1 != s0 {
            let (instant, to) = bisect_change(t0, s0, t1, s1, &state)?;
            changes.push(StateChange { instant, from: s0, to });
        }
        t0 = t1;
        s0 = s1;
    }
    Ok(changes)
}

/// Boolean-predicate search: every flip of `predicate` in the window.
/// A false→true flip is [`Transition::Rising`]. `aux` supplies the value
/// recorded on each candidate.
pub fn find_transitions<P, A>(
    window: &EventWindow,
    step: Duration,
    predicate: P,
    aux: A,
) -> SearchResult<Vec<Candidate>>
where
    P: Fn(DateTime<Utc>) -> SearchResult<bool>,
    A: Fn(DateTime<Utc>) -> SearchResult<f64>,
{
    find_discrete(window.start, window.end, step, predicate)?
        .into_iter()
        .map(|change| {
            Ok(Candidate {
                instant: change.instant,
                transition: if change.to {
                    Transition::Rising
                } else {
                    Transition::Falling
                },
                value: aux(change.instant)?,
            })
        })
        .collect()
}

/// Crossings of `threshold` by a real-valued signal, bisected on the
/// predicate `signal >= threshold`.
pub fn find_threshold_crossings<F>(
    window: &EventWindow,
    step: Duration,
    threshold: f64,
    signal: F,
) -> SearchResult<Vec<Candidate>>
where
    F: Fn(DateTime<Utc>) -> SearchResult<f64>,
{
    find_transitions(window, step, |t| Ok(signal(t)? >= threshold), |_| Ok(threshold))
}

/// Evaluate `signal` every `step` from `start` through `end` inclusive.
pub fn sample<F>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    signal: F,
) -> SearchResult<Vec<Sample>>
where
    F: Fn(DateTime<Utc>) -> SearchResult<f64>,
{
    let mut samples = Vec::new();
    if step <= Duration::zero() {
        return Ok(samples);
    }
    let mut t = start;
    while t <= end {
        samples.push(Sample {
            instant: t,
            value: signal(t)?,
        });
        t += step;
    }
    Ok(samples)
}

/// Linearly interpolated crossings of `threshold` between adjacent samples.
pub fn interpolate_crossings(samples: &[Sample], threshold: f64) -> Vec<Candidate> {
    samples
        .windows(2)
        .filter_map(|w| {
            let (a, b) = (w[0], w[1]);
            let (above_a, above_b) = (a.value >= threshold, b.value >= threshold);
            if above_a == above_b {
                return None;
            }
            let frac = (threshold - a.value) / (b.value - a.value);
            let span = (b.instant - a.instant).num_milliseconds() as f64;
            Some(Candidate {
                instant: a.instant + Duration::milliseconds((frac * span).round() as i64),
                transition: if above_b {
                    Transition::Rising
                } else {
                    Transition::Falling
                },
                value: threshold,
            })
        })
        .collect()
}

/// Local maxima of equally spaced samples, each refined to the vertex of
/// the parabola through it and its two neighbours.
pub fn refine_peaks(samples: &[Sample]) -> Vec<Candidate> {
    samples
        .windows(3)
        .filter(|w| w[1].value >= w[0].value && w[1].value > w[2].value)
        .map(|w| {
            let (y1, y2, y3) = (w[0].value, w[1].value, w[2].value);
            let h = (w[2].instant - w[1].instant).num_milliseconds() as f64;
            let denom = y1 - 2.0 * y2 + y3;
            let offset = if denom == 0.0 {
                0.0
            } else {
                0.5 * (y1 - y3) / denom
            };
            Candidate {
                instant: w[1].instant + Duration::milliseconds((offset * h).round() as i64),
                transition: Transition::Falling,
                value: y2 - 0.25 * (y1 - y3) * offset,
            }
        })
        .collect()
}

/// The first candidate inside the local day; failing that, the one
/// closest to local noon.
pub fn choose_best(candidates: &[Candidate], day: &LocalDay) -> Option<Candidate> {
    candidates
        .iter()
        .find(|c| day.contains(c.instant))
        .or_else(|| closest_to_noon(candidates, day))
        .copied()
}

/// The highest-valued candidate inside the local day (upper over lower
/// transit); failing that, the one closest to local noon.
pub fn choose_highest(candidates: &[Candidate], day: &LocalDay) -> Option<Candidate> {
    candidates
        .iter()
        .filter(|c| day.contains(c.instant))
        .max_by(|a, b| a.value.total_cmp(&b.value))
        .or_else(|| closest_to_noon(candidates, day))
        .copied()
}

fn closest_to_noon<'a>(candidates: &'a [Candidate], day: &LocalDay) -> Option<&'a Candidate> {
    let noon = day.noon();
    candidates
        .iter()
        .min_by_key(|c| (c.instant - noon).num_milliseconds().abs())
}

/// Only the candidates with the given direction.
pub fn with_transition(candidates: &[Candidate], transition: Transition) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| c.transition == transition)
        .copied()
        .collect()
}
