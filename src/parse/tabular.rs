/// SWL tabular page parser.
///
/// The Southwestern Division publishes one fixed-width page per project.
/// Two labeled constants appear somewhere in the header:
///
/// ```text
///   Top Flood Pool: 487.00        Current Power Pool: 461.44
/// ```
///
/// followed by hourly data lines of exactly eight whitespace-separated
/// tokens:
///
/// ```text
/// DDMMMYYYY HHMM  elevation  f2  f3  f4  f5  total_release
/// 14OCT2026 0600  461.18     ... ... ... ... 3210
/// ```
///
/// Grammar per data line:
/// - date: two digits, three uppercase month letters, four digits;
/// - time: four digits, `2400` meaning 23:59 of that date;
/// - six value tokens, each non-empty and made only of digits, `.` and `-`.
///
/// Only the first and sixth value are kept. A value token containing `-`
/// (the `----` placeholder included) is no reading, as is anything that does
/// not parse or sits at or below the -99 sensor fault sentinel. Lines that
/// break the grammar, or whose date does not exist, are skipped.

use chrono::{DateTime, NaiveDate, Utc};

use super::cursor::Cursor;
use super::{utc_at, ParseContext, SourceParser};
use crate::analysis::series::{day_label, round_to, round_whole, summarize};
use crate::model::{Field, Observation, ParseError};
use crate::snapshot::{DayAverage, Reading};

const TOP_FLOOD_POOL_LABEL: &str = "Top Flood Pool:";
const CURRENT_POWER_POOL_LABEL: &str = "Current Power Pool:";

/// Values at or below this are fault codes, not readings.
const SENTINEL_FLOOR: f64 = -99.0;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything lifted off one tabular page.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularReport {
    pub top_flood_pool: Option<f64>,
    pub current_power_pool: Option<f64>,
    /// Ascending by timestamp; never empty.
    pub observations: Vec<Observation>,
}

impl TabularReport {
    pub fn feet_below_flood_pool(&self) -> Option<f64> {
        Some(self.top_flood_pool? - self.current_power_pool?)
    }

    pub fn last_reading(&self) -> Option<DateTime<Utc>> {
        self.observations.last().map(|obs| obs.timestamp)
    }

    pub fn to_reading(&self) -> Result<Reading, ParseError> {
        let last_reading = self.last_reading().ok_or(ParseError::NoTabularRows)?;
        let gage = summarize(&self.observations, Field::Elevation);
        let flow = summarize(&self.observations, Field::TotalRelease);

        Ok(Reading {
            top_flood_pool: self.top_flood_pool.and_then(|v| round_to(v, 2)),
            current_power_pool: self.current_power_pool.and_then(|v| round_to(v, 2)),
            feet_below_flood_pool: self.feet_below_flood_pool().and_then(|v| round_to(v, 2)),
            gage: gage.latest.and_then(|v| round_to(v, 2)),
            flow: flow.latest.and_then(round_whole),
            gage_trend24: gage.trend_24h.and_then(|v| round_to(v, 2)),
            gage_trend7: gage.trend_7d.and_then(|v| round_to(v, 2)),
            flow_trend24: flow.trend_24h.and_then(round_whole),
            flow_trend7: flow.trend_7d.and_then(round_whole),
            gages7: gage
                .daily
                .iter()
                .filter_map(|d| {
                    Some(DayAverage {
                        day: day_label(d.day),
                        avg: round_to(d.avg, 2)?,
                    })
                })
                .collect(),
            flows7: flow
                .daily
                .iter()
                .filter_map(|d| {
                    Some(DayAverage {
                        day: day_label(d.day),
                        avg: round_whole(d.avg)?,
                    })
                })
                .collect(),
            power_pool: None,
            last_reading,
        })
    }
}

/// `SourceParser` for SWL tabular pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularParser;

impl SourceParser for TabularParser {
    fn parse(&self, raw: &str, _ctx: &ParseContext<'_>) -> Result<Reading, ParseError> {
        parse_tabular(raw)?.to_reading()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a whole page. Fails only when no data line survives.
pub fn parse_tabular(raw: &str) -> Result<TabularReport, ParseError> {
    let mut observations: Vec<Observation> = raw.lines().filter_map(parse_data_line).collect();
    if observations.is_empty() {
        return Err(ParseError::NoTabularRows);
    }
    observations.sort_by_key(|obs| obs.timestamp);

    Ok(TabularReport {
        top_flood_pool: labeled_value(raw, TOP_FLOOD_POOL_LABEL),
        current_power_pool: labeled_value(raw, CURRENT_POWER_POOL_LABEL),
        observations,
    })
}

/// First `<label> <number>` in the text, label matched without case.
///
/// An occurrence not followed by digits is passed over in favor of a later
/// one. A number that does not parse (e.g. `461.4.4`) counts as absent.
pub fn labeled_value(raw: &str, label: &str) -> Option<f64> {
    let haystack = raw.to_ascii_lowercase();
    let needle = label.to_ascii_lowercase();
    for (idx, _) in haystack.match_indices(&needle) {
        let mut cursor = Cursor::at(raw, idx + label.len());
        cursor.skip_ws();
        let rest = cursor.rest();
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_digit() || *b == b'.')
            .count();
        if len > 0 {
            return rest[..len].parse().ok();
        }
    }
    None
}

/// Decodes one data line, or `None` if it is not one.
fn parse_data_line(line: &str) -> Option<Observation> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [date, time, values @ ..] = tokens.as_slice() else {
        return None;
    };
    if values.len() != 6 || !values.iter().all(|v| is_value_token(v)) {
        return None;
    }
    let timestamp = decode_timestamp(date, time)?;
    Observation::new(timestamp, reading_value(values[0]), reading_value(values[5]))
}

fn is_value_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-')
}

/// Value of a data token, treating placeholders and fault codes as absent.
pub fn reading_value(token: &str) -> Option<f64> {
    if token.is_empty() || token.contains('-') {
        return None;
    }
    let value: f64 = token.parse().ok()?;
    if !value.is_finite() || value <= SENTINEL_FLOOR {
        return None;
    }
    Some(value)
}

/// `DDMMMYYYY` + `HHMM` → UTC instant.
pub fn decode_timestamp(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let bytes = date.as_bytes();
    if bytes.len() != 9
        || !bytes[..2].iter().all(u8::is_ascii_digit)
        || !bytes[2..5].iter().all(u8::is_ascii_uppercase)
        || !bytes[5..].iter().all(u8::is_ascii_digit)
    {
        return None;
    }
    if time.len() != 4 || !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let day: u32 = date[..2].parse().ok()?;
    let month = MONTHS.iter().position(|m| *m == &date[2..5])? as u32 + 1;
    let year: i32 = date[5..].parse().ok()?;
    let mut hour: u32 = time[..2].parse().ok()?;
    let mut minute: u32 = time[2..].parse().ok()?;
    if hour == 24 {
        hour = 23;
        minute = 59;
    }

    utc_at(NaiveDate::from_ymd_opt(year, month, day)?, hour, minute)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = "\
                 GREERS FERRY DAM - LITTLE RED RIVER
   Top Flood Pool: 470.00     Current Power Pool: 462.35

   Date    Time   Elev    Tail    Gen    Spill   Inflow  Total
 14OCT2026 2300  461.10   ----    120    0       800     3000
 15OCT2026 0100  461.14   170.2   120    0       850     3100
 15OCT2026 2400  461.20   170.3   ----   0       900     ----
";

    #[test]
    fn test_labeled_constants_and_flood_pool_margin() {
        let report = parse_tabular(PAGE).unwrap();
        assert_eq!(report.top_flood_pool, Some(470.00));
        assert_eq!(report.current_power_pool, Some(462.35));
        let reading = report.to_reading().unwrap();
        assert_eq!(reading.feet_below_flood_pool, Some(7.65));
    }

    #[test]
    fn test_labels_are_case_insensitive_and_optional() {
        assert_eq!(labeled_value("top flood pool:   480.5", TOP_FLOOD_POOL_LABEL), Some(480.5));
        assert_eq!(labeled_value("no labels here", TOP_FLOOD_POOL_LABEL), None);
        assert_eq!(
            labeled_value("Top Flood Pool: n/a ... Top Flood Pool: 481", TOP_FLOOD_POOL_LABEL),
            Some(481.0)
        );
    }

    #[test]
    fn test_missing_constant_leaves_margin_null() {
        let page = " 15OCT2026 0100  461.14  1  2  3  4  3100\n Current Power Pool: 462.35";
        let reading = parse_tabular(page).unwrap().to_reading().unwrap();
        assert_eq!(reading.top_flood_pool, None);
        assert_eq!(reading.current_power_pool, Some(462.35));
        assert_eq!(reading.feet_below_flood_pool, None);
    }

    #[test]
    fn test_placeholder_release_is_absent() {
        let report = parse_tabular(PAGE).unwrap();
        let last = report.observations.last().unwrap();
        assert_eq!(last.elevation, Some(461.20));
        assert_eq!(last.total_release, None);
    }

    #[test]
    fn test_2400_is_end_of_day() {
        let report = parse_tabular(PAGE).unwrap();
        assert_eq!(
            report.last_reading(),
            Some(Utc.with_ymd_and_hms(2026, 10, 15, 23, 59, 0).unwrap())
        );
    }

    #[test]
    fn test_reading_value_rules() {
        assert_eq!(reading_value("----"), None);
        assert_eq!(reading_value("-5.0"), None);
        assert_eq!(reading_value("1.2.3"), None);
        assert_eq!(reading_value("3210"), Some(3210.0));
        assert_eq!(reading_value("0"), Some(0.0));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let page = "\
 15OCT2026 0100  461.14  1  2  3  4  3100
 32OCT2026 0100  461.14  1  2  3  4  3100
 15Oct2026 0100  461.14  1  2  3  4  3100
 15XYZ2026 0100  461.14  1  2  3  4  3100
 15OCT2026 100   461.14  1  2  3  4  3100
 15OCT2026 0200  461.14  1  2  3  4
 15OCT2026 0300  461.14  1  2  M  4  3100
 15OCT2026 0400  ----    1  2  3  4  ----
";
        let report = parse_tabular(page).unwrap();
        assert_eq!(report.observations.len(), 1);
    }

    #[test]
    fn test_no_data_lines_is_a_failure() {
        let page = "Top Flood Pool: 470.00\nCurrent Power Pool: 462.35\nNo data.";
        assert_eq!(parse_tabular(page), Err(ParseError::NoTabularRows));
    }

    #[test]
    fn test_lines_are_sorted_by_time() {
        let page = "\
 15OCT2026 0200  461.30  1  2  3  4  3300
 14OCT2026 0200  461.00  1  2  3  4  3000
 15OCT2026 0100  461.20  1  2  3  4  3200
";
        let report = parse_tabular(page).unwrap();
        let elevations: Vec<_> = report.observations.iter().map(|o| o.elevation).collect();
        assert_eq!(elevations, vec![Some(461.00), Some(461.20), Some(461.30)]);
        let reading = report.to_reading().unwrap();
        assert_eq!(reading.gage, Some(461.30));
        assert_eq!(reading.flow, Some(3300));
        assert_eq!(reading.gage_trend24, Some(0.3));
        assert_eq!(reading.flow_trend24, Some(300));
    }

    #[test]
    fn test_daily_series_round_per_field() {
        let page = "\
 14OCT2026 0600  461.001  1  2  3  4  3000.4
 14OCT2026 1800  461.004  1  2  3  4  3001.0
 15OCT2026 0600  461.50   1  2  3  4  ----
";
        let reading = parse_tabular(page).unwrap().to_reading().unwrap();
        assert_eq!(
            reading.gages7,
            vec![
                DayAverage { day: "Oct 14".to_string(), avg: 461.0 },
                DayAverage { day: "Oct 15".to_string(), avg: 461.5 },
            ]
        );
        assert_eq!(
            reading.flows7,
            vec![DayAverage { day: "Oct 14".to_string(), avg: 3001 }]
        );
        // Latest row has no release, so the nearest earlier one stands in.
        assert_eq!(reading.flow, Some(3001));
    }
}
