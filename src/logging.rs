/// Structured logging for the USACE snapshot build
///
/// Provides context-rich logging with source keys, timestamps, and
/// severity levels. Supports both console output and an append-only log
/// file for scheduled builds.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{FetchError, ParseError, SourceError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// Page parsing and record assembly
    Usace,
    /// Page retrieval
    Http,
    /// Registry and settings
    Config,
    /// Snapshot file output
    Output,
    System,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Usace => write!(f, "USACE"),
            LogSource::Http => write!(f, "HTTP"),
            LogSource::Config => write!(f, "CFG"),
            LogSource::Output => write!(f, "OUT"),
            LogSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - page temporarily unavailable or between updates
    Expected,
    /// Unexpected failure - configuration problem or upstream layout change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: LogSource, key: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let key_part = key.map(|k| format!(" [{}]", k)).unwrap_or_default();
        let log_entry = format_entry(level, source, key, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, key_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, key_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG]{} {}", key_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One log line: `<UTC timestamp> <LEVEL> <SOURCE>[ [key]]: <message>`.
fn format_entry(level: LogLevel, source: LogSource, key: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let key_part = key.map(|k| format!(" [{}]", k)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, source, key_part, message)
}

fn with_logger(level: LogLevel, source: LogSource, key: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, key, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(source: LogSource, key: Option<&str>, message: &str) {
    with_logger(LogLevel::Info, source, key, message);
}

/// Log a warning message
pub fn warn(source: LogSource, key: Option<&str>, message: &str) {
    with_logger(LogLevel::Warning, source, key, message);
}

/// Log an error message
pub fn error(source: LogSource, key: Option<&str>, message: &str) {
    with_logger(LogLevel::Error, source, key, message);
}

/// Log a debug message
pub fn debug(source: LogSource, key: Option<&str>, message: &str) {
    with_logger(LogLevel::Debug, source, key, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a per-source failure.
///
/// Gateway errors and timeouts are routine for the district servers and
/// clear on the next build. A named reservoir missing from the bulletin,
/// or a misconfigured source, points at a layout or registry change.
pub fn classify_source_failure(err: &SourceError) -> FailureType {
    match err {
        SourceError::Fetch(FetchError::Http { status, .. }) => match status {
            502..=504 => FailureType::Expected,
            400..=499 => FailureType::Unexpected,
            _ => FailureType::Unknown,
        },
        SourceError::Fetch(FetchError::Transport { message, .. }) => {
            if message.contains("timed out") || message.contains("timeout") {
                FailureType::Expected
            } else {
                FailureType::Unknown
            }
        }
        // An empty table is also what a page in maintenance looks like.
        SourceError::Parse(ParseError::NoTabularRows) => FailureType::Unknown,
        SourceError::Parse(ParseError::ReservoirRowNotFound(_))
        | SourceError::Parse(ParseError::MissingReservoirName)
        | SourceError::Parse(ParseError::InvalidReadingTime(_)) => FailureType::Unexpected,
    }
}

/// Log a source failure with automatic classification
pub fn log_source_failure(key: &str, err: &SourceError) {
    let failure_type = classify_source_failure(err);
    let source = match err {
        SourceError::Fetch(_) => LogSource::Http,
        SourceError::Parse(_) => LogSource::Usace,
    };
    let message = format!("snapshot failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, Some(key), &message),
        FailureType::Unexpected => error(source, Some(key), &message),
        FailureType::Unknown => warn(source, Some(key), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one snapshot build
pub fn log_snapshot_summary(total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Snapshot complete: {}/{} sources ok, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(LogSource::Usace, None, &message);
    } else if successful == 0 {
        error(LogSource::Usace, None, &message);
    } else {
        warn(LogSource::Usace, None, &message);
    }
}
