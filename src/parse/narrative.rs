/// MVK reservoir report parser.
///
/// The Vicksburg District bulletin arrives as markdown. Its header carries
/// the report date,
///
/// ```text
/// Last Updated - OCTOBER 16, 2026 @ 0800
/// ```
///
/// and each reservoir gets one row in a fixed left-to-right template:
///
/// ```text
/// [DeGray](link) 10/16 @ 0700 [402.71](link) -0.15 408.00-5.29
///  label          M/D    HHMM  pool elev      24h    power pool, offset
/// ```
///
/// Grammar of a row (`ws*` optional whitespace, `ws+` required):
///
/// ```text
/// '[' NAME ']' '(' [^)]* ')' ws* D{1,2} '/' D{1,2} ws* '@' ws* D{3,4} ws*
/// '[' NUM ']' '(' [^)]* ')' ws* TREND ws+ NUM SIGNED
///
/// NUM    = [+-]? D+ ('.' D+)?
/// TREND  = [+-]? (D+ '.' D+ | '.' D+)
/// SIGNED = [+-] D+ ('.' D+)?
/// ```
///
/// `NAME` is compared without ASCII case. The first row matching the whole
/// template wins; a row that deviates anywhere does not match at all, so a
/// layout change yields an error record instead of a half-filled one.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::cursor::{Cursor, Fraction, Sign};
use super::{utc_at, ParseContext, SourceParser};
use crate::analysis::series::{day_label, round_to};
use crate::model::{Observation, ParseError};
use crate::snapshot::{DayAverage, PowerPoolContext, Reading};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The single row published for one reservoir.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeReport {
    /// Pool elevation at the row's reading time; never carries a release.
    pub observation: Observation,
    pub gage_trend_24h: f64,
    pub power_pool_elevation: f64,
    pub above_below_power_pool: f64,
}

impl NarrativeReport {
    pub fn pool_elevation(&self) -> f64 {
        self.observation.elevation.unwrap_or(f64::NAN)
    }

    pub fn to_reading(&self) -> Reading {
        let pool = round_to(self.pool_elevation(), 2);
        let timestamp = self.observation.timestamp;
        Reading {
            top_flood_pool: None,
            // The bulletin has no separate power pool level; the pool
            // elevation is the lake-level figure.
            current_power_pool: pool,
            feet_below_flood_pool: None,
            gage: pool,
            flow: None,
            gage_trend24: round_to(self.gage_trend_24h, 2),
            gage_trend7: None,
            flow_trend24: None,
            flow_trend7: None,
            gages7: pool
                .map(|avg| DayAverage {
                    day: day_label(timestamp.date_naive()),
                    avg,
                })
                .into_iter()
                .collect(),
            flows7: Vec::new(),
            power_pool: Some(PowerPoolContext {
                power_pool_elevation: round_to(self.power_pool_elevation, 2),
                above_below_power_pool: round_to(self.above_below_power_pool, 2),
            }),
            last_reading: timestamp,
        }
    }
}

/// `SourceParser` for the MVK bulletin.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeParser;

impl SourceParser for NarrativeParser {
    fn parse(&self, raw: &str, ctx: &ParseContext<'_>) -> Result<Reading, ParseError> {
        let name = ctx
            .reservoir_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(ParseError::MissingReservoirName)?;
        Ok(parse_narrative(raw, name, ctx.now)?.to_reading())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Raw fields of a matched row, before the date is resolved.
#[derive(Debug, Clone, PartialEq)]
struct RowFields {
    month: u32,
    day: u32,
    hhmm: String,
    pool_elevation: f64,
    gage_trend_24h: f64,
    power_pool_elevation: f64,
    above_below_power_pool: f64,
}

/// Finds `reservoir_name`'s row and decodes it.
///
/// The year comes from the "Last Updated" header, or from `now` when the
/// header is missing.
pub fn parse_narrative(
    markdown: &str,
    reservoir_name: &str,
    now: DateTime<Utc>,
) -> Result<NarrativeReport, ParseError> {
    let year = report_year(markdown).unwrap_or_else(|| now.year());
    let fields = markdown
        .match_indices('[')
        .find_map(|(idx, _)| match_row(&mut Cursor::at(markdown, idx), reservoir_name))
        .ok_or_else(|| ParseError::ReservoirRowNotFound(reservoir_name.to_string()))?;

    let hour: u32 = fields.hhmm[..2].parse().unwrap_or(0);
    let minute: u32 = fields.hhmm[2..].parse().unwrap_or(0);
    let timestamp = NaiveDate::from_ymd_opt(year, fields.month, fields.day)
        .and_then(|date| utc_at(date, hour, minute))
        .ok_or_else(|| {
            ParseError::InvalidReadingTime(format!(
                "{}/{} @ {} ({})",
                fields.month, fields.day, fields.hhmm, year
            ))
        })?;

    Ok(NarrativeReport {
        observation: Observation {
            timestamp,
            elevation: Some(fields.pool_elevation),
            total_release: None,
        },
        gage_trend_24h: fields.gage_trend_24h,
        power_pool_elevation: fields.power_pool_elevation,
        above_below_power_pool: fields.above_below_power_pool,
    })
}

/// Year from the first well-formed `Last Updated - MONTH D, YYYY @` header.
pub fn report_year(markdown: &str) -> Option<i32> {
    const LABEL: &str = "last updated";
    let lowered = markdown.to_ascii_lowercase();
    lowered
        .match_indices(LABEL)
        .find_map(|(idx, _)| match_header(&mut Cursor::at(markdown, idx + LABEL.len())))
}

fn match_header(c: &mut Cursor<'_>) -> Option<i32> {
    c.skip_ws();
    if !c.eat('-') {
        return None;
    }
    c.skip_ws();
    c.take_letters()?;
    if !c.eat_ws1() {
        return None;
    }
    c.take_digits(1, 2)?;
    if !c.eat(',') {
        return None;
    }
    c.skip_ws();
    let year = c.take_digits(4, 4)?;
    c.skip_ws();
    if !c.eat('@') {
        return None;
    }
    year.parse().ok()
}

fn match_row(c: &mut Cursor<'_>, reservoir_name: &str) -> Option<RowFields> {
    if !(c.eat('[') && c.eat_ignore_case(reservoir_name) && c.eat(']') && c.eat('(')) {
        return None;
    }
    c.take_until(')')?;
    c.skip_ws();

    let month = c.take_digits(1, 2)?.parse().ok()?;
    if !c.eat('/') {
        return None;
    }
    let day = c.take_digits(1, 2)?.parse().ok()?;
    c.skip_ws();
    if !c.eat('@') {
        return None;
    }
    c.skip_ws();
    let hhmm = format!("{:0>4}", c.take_digits(3, 4)?);
    c.skip_ws();

    if !c.eat('[') {
        return None;
    }
    let pool_elevation = c.take_number(Sign::Optional, Fraction::Optional)?;
    if !(c.eat(']') && c.eat('(')) {
        return None;
    }
    c.take_until(')')?;
    c.skip_ws();

    let gage_trend_24h = c.take_number(Sign::Optional, Fraction::Required)?;
    if !c.eat_ws1() {
        return None;
    }
    let power_pool_elevation = c.take_number(Sign::Optional, Fraction::Optional)?;
    let above_below_power_pool = c.take_number(Sign::Required, Fraction::Optional)?;

    Some(RowFields {
        month,
        day,
        hhmm,
        pool_elevation,
        gage_trend_24h,
        power_pool_elevation,
        above_below_power_pool,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BULLETIN: &str = "\
# Vicksburg District Reservoir Report

Last Updated - OCTOBER 16, 2025 @ 0800

| Reservoir | Date/Time | Pool | 24 Hr | Power Pool |
| --- | --- | --- | --- | --- |
[Blakely](http://www.mvk-wc.usace.army.mil/blakely.htm) 10/16 @ 700 [576.82](http://x/bla) -0.06 578.00-1.18
[DeGray](http://www.mvk-wc.usace.army.mil/degray.htm) 10/15 @ 2400 [402.71](http://x/deg) +.15 408.00-5.29
[Greeson](http://www.mvk-wc.usace.army.mil/greeson.htm) 10/16 @ 0700 [544.10](http://x/gre) 0.00 548.00+3.90
";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_report_year_from_header() {
        assert_eq!(report_year(BULLETIN), Some(2025));
        assert_eq!(report_year("last updated -  march 3,2024@"), Some(2024));
        assert_eq!(report_year("Last Updated: today"), None);
    }

    #[test]
    fn test_parses_named_row() {
        let report = parse_narrative(BULLETIN, "Blakely", fixed_now()).unwrap();
        assert_eq!(
            report.observation.timestamp,
            Utc.with_ymd_and_hms(2025, 10, 16, 7, 0, 0).unwrap()
        );
        assert_eq!(report.observation.elevation, Some(576.82));
        assert_eq!(report.observation.total_release, None);
        assert_eq!(report.gage_trend_24h, -0.06);
        assert_eq!(report.power_pool_elevation, 578.00);
        assert_eq!(report.above_below_power_pool, -1.18);
    }

    #[test]
    fn test_name_match_ignores_case() {
        let report = parse_narrative(BULLETIN, "greeson", fixed_now()).unwrap();
        assert_eq!(report.above_below_power_pool, 3.90);
        assert_eq!(report.gage_trend_24h, 0.0);
    }

    #[test]
    fn test_hour_24_rolls_to_next_day() {
        let report = parse_narrative(BULLETIN, "DeGray", fixed_now()).unwrap();
        assert_eq!(
            report.observation.timestamp,
            Utc.with_ymd_and_hms(2025, 10, 16, 0, 0, 0).unwrap()
        );
        assert_eq!(report.gage_trend_24h, 0.15);
    }

    #[test]
    fn test_year_falls_back_to_clock() {
        let text = "[DeGray](x) 3/1 @ 1230 [402.00](y) -0.10 408.00-6.00";
        let report = parse_narrative(text, "DeGray", fixed_now()).unwrap();
        assert_eq!(
            report.observation.timestamp,
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_row_is_a_failure() {
        assert_eq!(
            parse_narrative(BULLETIN, "Ouachita", fixed_now()),
            Err(ParseError::ReservoirRowNotFound("Ouachita".to_string()))
        );
    }

    #[test]
    fn test_reordered_row_fails_closed() {
        // Trend and pool swapped: nothing is extracted.
        let text = "[DeGray](x) 10/16 @ 0700 -0.15 [402.71](y) 408.00-5.29";
        assert!(parse_narrative(text, "DeGray", fixed_now()).is_err());
        // Trend without a decimal point does not fit the template.
        let text = "[DeGray](x) 10/16 @ 0700 [402.71](y) 0 408.00-5.29";
        assert!(parse_narrative(text, "DeGray", fixed_now()).is_err());
    }

    #[test]
    fn test_impossible_date_is_invalid_reading_time() {
        let text = "[DeGray](x) 2/30 @ 0700 [402.71](y) -0.15 408.00-5.29";
        assert!(matches!(
            parse_narrative(text, "DeGray", fixed_now()),
            Err(ParseError::InvalidReadingTime(_))
        ));
    }

    #[test]
    fn test_later_row_found_after_partial_match() {
        let text = "[DeGray](x) see below\n[DeGray](x) 10/16 @ 0700 [402.71](y) -0.15 408.00-5.29";
        let report = parse_narrative(text, "DeGray", fixed_now()).unwrap();
        assert_eq!(report.observation.elevation, Some(402.71));
    }

    #[test]
    fn test_reading_fields() {
        let reading = parse_narrative(BULLETIN, "Blakely", fixed_now())
            .unwrap()
            .to_reading();
        assert_eq!(reading.gage, Some(576.82));
        assert_eq!(reading.current_power_pool, Some(576.82));
        assert_eq!(reading.top_flood_pool, None);
        assert_eq!(reading.feet_below_flood_pool, None);
        assert_eq!(reading.flow, None);
        assert_eq!(reading.gage_trend24, Some(-0.06));
        assert_eq!(reading.gage_trend7, None);
        assert_eq!(reading.flow_trend24, None);
        assert_eq!(reading.flow_trend7, None);
        assert_eq!(
            reading.gages7,
            vec![DayAverage { day: "Oct 16".to_string(), avg: 576.82 }]
        );
        assert!(reading.flows7.is_empty());
        assert_eq!(
            reading.power_pool,
            Some(PowerPoolContext {
                power_pool_elevation: Some(578.0),
                above_below_power_pool: Some(-1.18),
            })
        );
    }

    #[test]
    fn test_parser_requires_reservoir_name() {
        let ctx = ParseContext { reservoir_name: None, now: fixed_now() };
        assert_eq!(
            NarrativeParser.parse(BULLETIN, &ctx),
            Err(ParseError::MissingReservoirName)
        );
    }
}
