/// Per-source derivation and snapshot assembly.
///
/// Each source is parsed independently. Any failure, whether the page could
/// not be fetched or could not be parsed, becomes that source's error
/// record; nothing here aborts the batch, and the snapshot always holds
/// exactly one record per configured source.

use chrono::{DateTime, Utc};

use crate::logging::{self, LogSource};
use crate::model::{FetchError, ParseError, SourceError};
use crate::parse::{parser_for, ParseContext};
use crate::snapshot::{Reading, Snapshot, WaterRecord};
use crate::sources::SourceConfig;

/// Raw page text for one source, or the retrieval failure in its place.
pub type Fetched = Result<String, FetchError>;

/// Runs the source's parser over its page text.
pub fn read_source(
    source: &SourceConfig,
    raw_text: &str,
    now: DateTime<Utc>,
) -> Result<Reading, ParseError> {
    let ctx = ParseContext {
        reservoir_name: source.reservoir_name.as_deref(),
        now,
    };
    parser_for(source.format).parse(raw_text, &ctx)
}

/// Builds the published record for one source.
pub fn build_record(source: &SourceConfig, fetched: &Fetched, now: DateTime<Utc>) -> WaterRecord {
    let outcome = match fetched {
        Ok(raw_text) => read_source(source, raw_text, now).map_err(SourceError::from),
        Err(e) => Err(SourceError::from(e.clone())),
    };

    match outcome {
        Ok(reading) => {
            logging::debug(
                LogSource::Usace,
                Some(&source.key),
                &format!("{} read at {}", source.name, reading.last_reading),
            );
            WaterRecord::ok(&source.provider, &source.url, reading)
        }
        Err(err) => {
            logging::log_source_failure(&source.key, &err);
            WaterRecord::error(&source.provider, &source.url, err.to_string())
        }
    }
}

/// Assembles the snapshot from each source's fetched text.
///
/// `now` stamps `generatedAt` and serves as the narrative parser's clock.
pub fn assemble<'a, I>(inputs: I, now: DateTime<Utc>) -> Snapshot
where
    I: IntoIterator<Item = (&'a SourceConfig, Fetched)>,
{
    let mut snapshot = Snapshot::new(now);
    for (source, fetched) in inputs {
        snapshot.insert(&source.key, build_record(source, &fetched, now));
    }

    let (ok, failed) = snapshot.status_counts();
    logging::log_snapshot_summary(snapshot.len(), ok, failed);
    snapshot
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
