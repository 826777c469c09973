//! Qibla Numa: prayer times, lunar events and sub-point geography for one
//! observer at one instant.
//!
//! Solar events come from a closed-form solar model and never fail. Lunar
//! events, phases, the tide heuristic and sub-points go through an
//! [`EphemerisOracle`](ephemeris::EphemerisOracle) and degrade to
//! "unavailable" when it cannot answer.

pub mod config;
pub mod ephemeris;
pub mod error;
pub mod geo;
pub mod location;
pub mod moon;
pub mod observer;
pub mod phase;
pub mod report;
pub mod schedule;
pub mod search;
pub mod solar;
pub mod tide;
