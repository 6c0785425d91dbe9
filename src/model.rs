/// Core data types for the USACE reservoir snapshot.
///
/// This module defines the shared domain model imported by all other modules:
/// observations, the field selector used by the normalizer, and the error
/// types every stage reports. It contains no parsing and no I/O.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// One timestamped reading from a reservoir data page.
///
/// Either value may be absent (placeholder token, sensor fault sentinel, or
/// a source that never reports that quantity), but never both.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    /// Pool elevation, in feet.
    pub elevation: Option<f64>,
    /// Total release (spillway + generation), in cubic feet per second.
    pub total_release: Option<f64>,
}

impl Observation {
    /// Returns `None` when both values are absent; such rows carry nothing
    /// worth keeping.
    pub fn new(
        timestamp: DateTime<Utc>,
        elevation: Option<f64>,
        total_release: Option<f64>,
    ) -> Option<Self> {
        if elevation.is_none() && total_release.is_none() {
            return None;
        }
        Some(Observation {
            timestamp,
            elevation,
            total_release,
        })
    }
}

/// Which measured quantity a series computation runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Elevation,
    TotalRelease,
}

impl Field {
    pub fn value(self, obs: &Observation) -> Option<f64> {
        match self {
            Field::Elevation => obs.elevation,
            Field::TotalRelease => obs.total_release,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons a page could not be turned into a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The tabular page contained no well-formed data lines.
    NoTabularRows,
    /// The bulletin has no row for the named reservoir.
    ReservoirRowNotFound(String),
    /// A narrative source was configured without a reservoir name.
    MissingReservoirName,
    /// The matched row carries a date that does not exist on the calendar.
    InvalidReadingTime(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NoTabularRows => write!(f, "No tabular rows parsed"),
            ParseError::ReservoirRowNotFound(name) => {
                write!(f, "No data parsed: no report row for reservoir '{}'", name)
            }
            ParseError::MissingReservoirName => {
                write!(f, "No data parsed: narrative source has no reservoir name")
            }
            ParseError::InvalidReadingTime(detail) => {
                write!(f, "No data parsed: invalid reading time {}", detail)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised while retrieving a page's raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Non-2xx HTTP response.
    Http { url: String, status: u16 },
    /// Connection, timeout, or body decoding failure.
    Transport { url: String, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http { url, status } => write!(f, "HTTP error: {} for {}", status, url),
            FetchError::Transport { url, message } => {
                write!(f, "Request failed for {}: {}", url, message)
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Anything that turns a single source into an error record.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    Fetch(FetchError),
    Parse(ParseError),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Fetch(e) => write!(f, "{}", e),
            SourceError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<FetchError> for SourceError {
    fn from(err: FetchError) -> Self {
        SourceError::Fetch(err)
    }
}

impl From<ParseError> for SourceError {
    fn from(err: ParseError) -> Self {
        SourceError::Parse(err)
    }
}

/// Errors loading the source registry or run settings.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Toml(toml::de::Error),
    /// The registry parsed but violates a structural rule.
    Invalid(String),
    /// An environment variable held an unusable value.
    Env { var: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "Cannot read {}: {}", path, source),
            ConfigError::Toml(e) => write!(f, "Invalid source registry: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid source registry: {}", msg),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value for {}: '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
