//! Error taxonomy.
//!
//! Domain non-occurrence (the sun never reaching an angle, the Moon not
//! rising on a given day) is not an error and never appears here; it is
//! carried as `Option` / [`crate::solar::AngleSolution`]. These types cover
//! upstream failures only.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Umbrella error for the binary and for callers that mix subsystems.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Observer(#[from] ObserverError),
}

/// Invalid observer input.
#[derive(Debug, Error, PartialEq)]
pub enum ObserverError {
    #[error("Latitude must be between -90 and 90, got {0}")]
    Latitude(f64),

    #[error("Longitude must be between -180 and 180, got {0}")]
    Longitude(f64),

    #[error("Unknown time zone '{0}'. Use IANA format (e.g. Asia/Kolkata)")]
    TimeZone(String),
}

/// Failure of the ephemeris oracle. Lunar, tide and sub-point sections
/// degrade to "unavailable" when this is raised; solar results never do.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EphemerisError {
    #[error("Ephemeris unavailable: {0}")]
    Unavailable(String),

    #[error("Instant {0} is outside the ephemeris coverage ({1}..={2})")]
    OutOfRange(String, i32, i32),
}

/// Location resolution errors.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Location not found: '{0}'")]
    NotFound(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Network providers disabled (offline mode)")]
    Offline,

    #[error("No location input for this strategy")]
    NoInput,

    #[error(transparent)]
    Observer(#[from] ObserverError),

    /// Every configured strategy failed. Fatal: there is no observer.
    #[error("Location could not be determined ({})", .0.join("; "))]
    Unresolved(Vec<String>),
}

/// Configuration loading / validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
