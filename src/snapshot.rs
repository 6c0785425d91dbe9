/// Output document written to `data/usace_levels.json`.
///
/// ```text
/// {
///   "generatedAt": "2026-10-16T13:00:00.000Z",
///   "waters": {
///     "greers": { "status": "ok", "provider": "USACE-SWL", "sourceUrl": ..., "gage": ... },
///     "degray": { "status": "error", "provider": "USACE-MVK", "sourceUrl": ..., "error": ... }
///   }
/// }
/// ```
///
/// A record is either a success carrying a `Reading` or a failure carrying
/// a cause string; the constructors make it impossible to hold both.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::path::Path;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One point of a daily-average series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAverage<T> {
    /// Short UTC date label, e.g. "Oct 5".
    pub day: String,
    pub avg: T,
}

/// Extra context only the narrative bulletin publishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerPoolContext {
    pub power_pool_elevation: Option<f64>,
    pub above_below_power_pool: Option<f64>,
}

/// Normalized lake-level figures for one reservoir.
///
/// Elevations are feet rounded to 2 decimals; releases are whole cfs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub top_flood_pool: Option<f64>,
    pub current_power_pool: Option<f64>,
    pub feet_below_flood_pool: Option<f64>,
    pub gage: Option<f64>,
    pub flow: Option<i64>,
    pub gage_trend24: Option<f64>,
    pub gage_trend7: Option<f64>,
    pub flow_trend24: Option<i64>,
    pub flow_trend7: Option<i64>,
    pub gages7: Vec<DayAverage<f64>>,
    pub flows7: Vec<DayAverage<i64>>,
    #[serde(flatten)]
    pub power_pool: Option<PowerPoolContext>,
    #[serde(serialize_with = "serialize_instant")]
    pub last_reading: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ok,
    Error,
}

/// Published state of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterRecord {
    status: RecordStatus,
    provider: String,
    source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(flatten)]
    reading: Option<Reading>,
}

impl WaterRecord {
    pub fn ok(provider: &str, source_url: &str, reading: Reading) -> Self {
        WaterRecord {
            status: RecordStatus::Ok,
            provider: provider.to_string(),
            source_url: source_url.to_string(),
            error: None,
            reading: Some(reading),
        }
    }

    pub fn error(provider: &str, source_url: &str, cause: impl Into<String>) -> Self {
        WaterRecord {
            status: RecordStatus::Error,
            provider: provider.to_string(),
            source_url: source_url.to_string(),
            error: Some(cause.into()),
            reading: None,
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn reading(&self) -> Option<&Reading> {
        self.reading.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Snapshot document
// ---------------------------------------------------------------------------

/// The full output document; `waters` keeps the registry's order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    waters: Vec<(String, WaterRecord)>,
}

impl Snapshot {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Snapshot {
            generated_at,
            waters: Vec::new(),
        }
    }

    /// Adds or replaces the record for `key`; a key never appears twice.
    pub fn insert(&mut self, key: &str, record: WaterRecord) {
        match self.waters.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = record,
            None => self.waters.push((key.to_string(), record)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&WaterRecord> {
        self.waters.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.waters.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.waters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waters.is_empty()
    }

    /// `(ok, error)` record counts.
    pub fn status_counts(&self) -> (usize, usize) {
        let ok = self
            .waters
            .iter()
            .filter(|(_, r)| r.status() == RecordStatus::Ok)
            .count();
        (ok, self.waters.len() - ok)
    }

    /// Pretty JSON (two-space indent) with a trailing newline.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Just the `waters` object, for comparing runs independent of
    /// `generatedAt`.
    pub fn waters_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Waters(&self.waters))
    }

    /// Overwrites `path` with the document, creating parent directories.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = self.to_json_pretty().map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }
}

struct Waters<'a>(&'a [(String, WaterRecord)]);

impl Serialize for Waters<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, record) in self.0 {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("Snapshot", 2)?;
        doc.serialize_field("generatedAt", &iso_instant(&self.generated_at))?;
        doc.serialize_field("waters", &Waters(&self.waters))?;
        doc.end()
    }
}

/// ISO-8601 UTC with milliseconds and a `Z` suffix.
pub fn iso_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_instant<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso_instant(instant))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
