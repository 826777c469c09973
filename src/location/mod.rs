//! Location intelligence subsystem.
//!
//! Turns coordinates, a free-text address or the caller's IP into an
//! [`Observer`](crate::observer::Observer): built-in gazetteer first, then
//! network providers unless offline.

pub mod providers;
pub mod resolver;
pub mod types;

pub use resolver::LocationResolver;
pub use types::{format_coords, LocationSource, ResolvedLocation, ZoneSource};
