/// Page parsers for USACE reservoir data.
///
/// Each supported page layout implements `SourceParser`, turning raw page
/// text into a `Reading` or a `ParseError`. The registry's format tag picks
/// the implementation through `parser_for`, so assembly never branches on
/// format itself.
///
/// Submodules:
/// - `cursor`    — small scanner the tokenizers are written against.
/// - `tabular`   — SWL fixed-width tabular pages (many dated rows).
/// - `narrative` — MVK markdown bulletin (one latest row per reservoir).

pub mod cursor;
pub mod narrative;
pub mod tabular;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::model::ParseError;
use crate::snapshot::Reading;
use crate::sources::SourceFormat;

pub use narrative::NarrativeParser;
pub use tabular::TabularParser;

/// Per-source inputs a parser may need besides the page text.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Row label to look for in a narrative bulletin.
    pub reservoir_name: Option<&'a str>,
    /// Clock used when the page itself does not state a year.
    pub now: DateTime<Utc>,
}

/// A page layout that can be turned into a `Reading`.
pub trait SourceParser {
    fn parse(&self, raw: &str, ctx: &ParseContext<'_>) -> Result<Reading, ParseError>;
}

/// Parser for the given page layout.
pub fn parser_for(format: SourceFormat) -> &'static dyn SourceParser {
    match format {
        SourceFormat::Tabular => &TabularParser,
        SourceFormat::Narrative => &NarrativeParser,
    }
}

/// Midnight of `date` plus the given clock time, in UTC.
///
/// Out-of-range hours or minutes roll forward into the following day the
/// way the district pages expect (`24:30` is half past midnight).
pub(crate) fn utc_at(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let stamp = midnight + Duration::hours(i64::from(hour)) + Duration::minutes(i64::from(minute));
    Some(DateTime::from_naive_utc_and_offset(stamp, Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
