/// Run settings for the snapshot build.
///
/// All settings come from the environment; `main` loads an optional `.env`
/// first via `dotenv`. Unset variables fall back to defaults, but a variable
/// that is set to something unusable is an error rather than a silent
/// default.
///
/// | Variable                  | Default                    |
/// |---------------------------|----------------------------|
/// | `USACE_OUT_PATH`          | `data/usace_levels.json`   |
/// | `USACE_SOURCES_PATH`      | built-in registry          |
/// | `USACE_HTTP_TIMEOUT_SECS` | `30`                       |
/// | `USACE_LOG_LEVEL`         | `info`                     |
/// | `USACE_LOG_FILE`          | none                       |

use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogLevel;
use crate::model::ConfigError;

pub const DEFAULT_OUT_PATH: &str = "data/usace_levels.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub out_path: PathBuf,
    /// `None` uses the registry compiled into the crate.
    pub sources_path: Option<String>,
    pub http_timeout: Duration,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            out_path: PathBuf::from(DEFAULT_OUT_PATH),
            sources_path: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`, so tests need not touch the real
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(path) = non_empty("USACE_OUT_PATH") {
            settings.out_path = PathBuf::from(path);
        }
        settings.sources_path = non_empty("USACE_SOURCES_PATH");
        settings.log_file = non_empty("USACE_LOG_FILE");

        if let Some(raw) = non_empty("USACE_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Env {
                    var: "USACE_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            settings.http_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = non_empty("USACE_LOG_LEVEL") {
            settings.log_level = raw.parse().map_err(|_| ConfigError::Env {
                var: "USACE_LOG_LEVEL",
                value: raw.clone(),
            })?;
        }

        Ok(settings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.out_path, PathBuf::from("data/usace_levels.json"));
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("USACE_OUT_PATH", "/tmp/levels.json"),
            ("USACE_SOURCES_PATH", "./usace_sources.toml"),
            ("USACE_HTTP_TIMEOUT_SECS", "10"),
            ("USACE_LOG_LEVEL", "debug"),
            ("USACE_LOG_FILE", ""),
        ]))
        .unwrap();
        assert_eq!(settings.out_path, PathBuf::from("/tmp/levels.json"));
        assert_eq!(settings.sources_path.as_deref(), Some("./usace_sources.toml"));
        assert_eq!(settings.http_timeout, Duration::from_secs(10));
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("USACE_HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("USACE_HTTP_TIMEOUT_SECS"));
        assert!(Settings::from_lookup(lookup_from(&[("USACE_HTTP_TIMEOUT_SECS", "0")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[("USACE_LOG_LEVEL", "loud")])).is_err());
    }
}
