/// Series math shared by every page format.
///
/// Submodules:
/// - `series` — latest value, nearest-to-offset lookback, trends, daily
///   averages, and the rounding rules the snapshot publishes with.

pub mod series;
