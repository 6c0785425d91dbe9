/// Reservoir source registry.
///
/// Defines which USACE pages are scraped, how each one is parsed, and the
/// key it is published under in the snapshot. The default registry is the
/// repository's `usace_sources.toml`, compiled into the binary so a build
/// works without any file on disk; `USACE_SOURCES_PATH` can point at a
/// replacement with the same layout.

use serde::Deserialize;
use std::collections::HashSet;

use crate::model::ConfigError;

/// The registry shipped with the crate.
pub const DEFAULT_SOURCES_TOML: &str = include_str!("../usace_sources.toml");

// ---------------------------------------------------------------------------
// Source metadata
// ---------------------------------------------------------------------------

/// Layout of a source page, which selects its parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Fixed-width tabular page with many dated rows.
    #[serde(alias = "swl-tabular")]
    Tabular,
    /// Markdown bulletin with one latest row per reservoir.
    #[serde(alias = "mvk-resrep")]
    Narrative,
}

/// Static descriptor for one published reservoir.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    /// Key in the snapshot's `waters` map.
    pub key: String,
    /// Display name, e.g. "Greers Ferry Lake".
    pub name: String,
    /// Provider tag copied onto every record, e.g. "USACE-SWL".
    pub provider: String,
    pub format: SourceFormat,
    /// Page the raw text is retrieved from; published as `sourceUrl`.
    pub url: String,
    /// Row label in a narrative bulletin. Required for narrative sources.
    #[serde(default)]
    pub reservoir_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceFile {
    #[serde(default)]
    source: Vec<SourceConfig>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates a registry document.
pub fn parse_sources(text: &str) -> Result<Vec<SourceConfig>, ConfigError> {
    let file: SourceFile = toml::from_str(text)?;
    validate(&file.source)?;
    Ok(file.source)
}

/// Reads a registry file from disk.
pub fn load_sources(path: &str) -> Result<Vec<SourceConfig>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_sources(&text)
}

/// The registry compiled into the crate.
pub fn builtin_sources() -> Result<Vec<SourceConfig>, ConfigError> {
    parse_sources(DEFAULT_SOURCES_TOML)
}

/// Looks up a source by key. Returns `None` if not found.
pub fn find_source<'a>(sources: &'a [SourceConfig], key: &str) -> Option<&'a SourceConfig> {
    sources.iter().find(|s| s.key == key)
}

fn validate(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for source in sources {
        if source.key.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "source '{}' has an empty key",
                source.name
            )));
        }
        if !seen.insert(source.key.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate source key '{}'",
                source.key
            )));
        }
        if source.format == SourceFormat::Narrative
            && source
                .reservoir_name
                .as_deref()
                .map_or(true, |name| name.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "narrative source '{}' needs a reservoir_name",
                source.key
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
