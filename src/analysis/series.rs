/// Time-series normalization over an ordered observation sequence.
///
/// Every function takes observations sorted ascending by timestamp and a
/// `Field` selector, so the same lookback and bucketing code serves both
/// elevation and release. Nothing here knows which page format the
/// observations came from.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::model::{Field, Observation};

/// Lookback for the short trend, in hours.
pub const TREND_24H_HOURS: i64 = 24;

/// Lookback for the long trend, in hours.
pub const TREND_7D_HOURS: i64 = 7 * 24;

/// Number of daily buckets kept in a series.
pub const DAILY_BUCKETS: usize = 7;

// ---------------------------------------------------------------------------
// Point lookups
// ---------------------------------------------------------------------------

/// Value at the latest reading.
///
/// The last observation by position anchors the series. When that row has
/// no value for `field`, the present value nearest to its timestamp stands
/// in for it.
pub fn latest_value(observations: &[Observation], field: Field) -> Option<f64> {
    let last = observations.last()?;
    field
        .value(last)
        .or_else(|| nearest_value(observations, last.timestamp, field))
}

/// Present value whose timestamp is closest to `target`.
///
/// Ties go to the first observation encountered.
pub fn nearest_value(
    observations: &[Observation],
    target: DateTime<Utc>,
    field: Field,
) -> Option<f64> {
    let mut best: Option<(i64, f64)> = None;
    for obs in observations {
        let Some(value) = field.value(obs) else {
            continue;
        };
        let diff = (obs.timestamp - target).num_milliseconds().abs();
        match best {
            Some((best_diff, _)) if diff >= best_diff => {}
            _ => best = Some((diff, value)),
        }
    }
    best.map(|(_, value)| value)
}

/// `latest − nearest(latest timestamp − offset)`, unrounded.
///
/// `None` when either operand is missing.
pub fn trend(observations: &[Observation], offset: Duration, field: Field) -> Option<f64> {
    let last = observations.last()?;
    let latest = latest_value(observations, field)?;
    let earlier = nearest_value(observations, last.timestamp - offset, field)?;
    Some(latest - earlier)
}

// ---------------------------------------------------------------------------
// Daily buckets
// ---------------------------------------------------------------------------

/// Mean of one UTC calendar day's present values.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAverage {
    pub day: NaiveDate,
    pub avg: f64,
}

/// Averages `field` per UTC day and keeps the most recent `DAILY_BUCKETS`
/// days, oldest first. Days with no present value are left out rather than
/// reported as gaps.
pub fn daily_averages(observations: &[Observation], field: Field) -> Vec<DailyAverage> {
    let mut buckets: std::collections::BTreeMap<NaiveDate, (f64, usize)> =
        std::collections::BTreeMap::new();
    for obs in observations {
        if let Some(value) = field.value(obs) {
            let entry = buckets.entry(obs.timestamp.date_naive()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let skip = buckets.len().saturating_sub(DAILY_BUCKETS);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(day, (sum, count))| DailyAverage {
            day,
            avg: sum / count as f64,
        })
        .collect()
}

/// Short month/day label used by the front end, e.g. `"Oct 5"`.
pub fn day_label(day: NaiveDate) -> String {
    day.format("%b %-d").to_string()
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Rounds to `places` decimals; non-finite input becomes `None`.
pub fn round_to(value: f64, places: i32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scale = 10f64.powi(places);
    Some((value * scale).round() / scale)
}

/// Rounds to the nearest integer with halves going up (`-2.5 → -2`).
pub fn round_whole(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    Some((value + 0.5).floor() as i64)
}

// ---------------------------------------------------------------------------
// Per-field summary
// ---------------------------------------------------------------------------

/// Everything the snapshot needs for one quantity, still unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub latest: Option<f64>,
    pub trend_24h: Option<f64>,
    pub trend_7d: Option<f64>,
    pub daily: Vec<DailyAverage>,
}

pub fn summarize(observations: &[Observation], field: Field) -> SeriesSummary {
    SeriesSummary {
        latest: latest_value(observations, field),
        trend_24h: trend(observations, Duration::hours(TREND_24H_HOURS), field),
        trend_7d: trend(observations, Duration::hours(TREND_7D_HOURS), field),
        daily: daily_averages(observations, field),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    fn elev(day: u32, hour: u32, value: f64) -> Observation {
        Observation::new(at(day, hour), Some(value), None).unwrap()
    }

    fn release(day: u32, hour: u32, value: f64) -> Observation {
        Observation::new(at(day, hour), None, Some(value)).unwrap()
    }

    #[test]
    fn test_latest_is_last_by_position() {
        // Out of timestamp order on purpose: position wins.
        let obs = vec![elev(2, 0, 300.0), elev(1, 0, 290.0)];
        assert_eq!(latest_value(&obs, Field::Elevation), Some(290.0));
    }

    #[test]
    fn test_latest_falls_back_to_nearest_present_value() {
        let obs = vec![elev(1, 0, 290.0), elev(1, 12, 291.0), release(1, 13, 5000.0)];
        assert_eq!(latest_value(&obs, Field::Elevation), Some(291.0));
        assert_eq!(latest_value(&obs, Field::TotalRelease), Some(5000.0));
    }

    #[test]
    fn test_latest_of_empty_sequence_is_none() {
        assert_eq!(latest_value(&[], Field::Elevation), None);
        assert_eq!(trend(&[], Duration::hours(TREND_24H_HOURS), Field::Elevation), None);
    }

    #[test]
    fn test_nearest_value_prefers_first_on_tie() {
        let obs = vec![elev(1, 10, 1.0), elev(1, 14, 2.0)];
        assert_eq!(nearest_value(&obs, at(1, 12), Field::Elevation), Some(1.0));
    }

    #[test]
    fn test_nearest_value_skips_absent_values() {
        let obs = vec![elev(1, 0, 1.0), release(1, 12, 900.0)];
        assert_eq!(nearest_value(&obs, at(1, 12), Field::Elevation), Some(1.0));
        assert_eq!(nearest_value(&obs, at(1, 0), Field::TotalRelease), Some(900.0));
    }

    #[test]
    fn test_nearest_value_with_only_absent_values_is_none() {
        let obs = vec![release(1, 0, 900.0)];
        assert_eq!(nearest_value(&obs, at(1, 0), Field::Elevation), None);
    }

    #[test]
    fn test_trend_24h_is_latest_minus_day_before() {
        let obs = vec![elev(1, 12, 295.0), elev(2, 0, 297.0), elev(2, 12, 300.0)];
        assert_eq!(trend(&obs, Duration::hours(TREND_24H_HOURS), Field::Elevation), Some(5.0));
    }

    #[test]
    fn test_trend_without_earlier_operand_is_none() {
        let obs = vec![release(1, 12, 295.0), elev(2, 12, 300.0)];
        assert_eq!(trend(&obs, Duration::hours(TREND_24H_HOURS), Field::TotalRelease), Some(0.0));
        let only_release = vec![release(2, 12, 295.0)];
        assert_eq!(trend(&only_release, Duration::hours(TREND_24H_HOURS), Field::Elevation), None);
    }

    #[test]
    fn test_daily_averages_per_day() {
        let obs = vec![elev(1, 6, 10.0), elev(1, 18, 12.0), elev(2, 6, 14.0)];
        let daily = daily_averages(&obs, Field::Elevation);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].avg, 11.0);
        assert_eq!(daily[1].avg, 14.0);
        assert_eq!(daily[0].day, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
    }

    #[test]
    fn test_daily_averages_keep_latest_seven_days() {
        let obs: Vec<_> = (1..=8).map(|d| elev(d, 12, d as f64)).collect();
        let daily = daily_averages(&obs, Field::Elevation);
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].avg, 2.0);
        assert_eq!(daily[6].avg, 8.0);
    }

    #[test]
    fn test_daily_averages_omit_days_without_values() {
        let obs = vec![elev(1, 6, 10.0), release(2, 6, 400.0), elev(3, 6, 12.0)];
        let daily = daily_averages(&obs, Field::Elevation);
        let days: Vec<_> = daily.iter().map(|d| day_label(d.day)).collect();
        assert_eq!(days, vec!["Oct 1", "Oct 3"]);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(470.00 - 462.35, 2), Some(7.65));
        assert_eq!(round_to(f64::NAN, 2), None);
        assert_eq!(round_whole(2.5), Some(3));
        assert_eq!(round_whole(-2.5), Some(-2));
        assert_eq!(round_whole(-2.6), Some(-3));
    }

    #[test]
    fn test_summarize_collects_both_trends() {
        let obs: Vec<_> = (1..=8).map(|d| elev(d, 12, 460.0 + d as f64)).collect();
        let summary = summarize(&obs, Field::Elevation);
        assert_eq!(summary.latest, Some(468.0));
        assert_eq!(summary.trend_24h, Some(1.0));
        assert_eq!(summary.trend_7d, Some(7.0));
        assert_eq!(summary.daily.len(), 7);
    }
}
