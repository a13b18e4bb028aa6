//! Interval-aligned time buckets

use chrono::{DateTime, Duration, SubsecRound, Timelike, Utc};

/// Start of the bucket holding `timestamp`.
///
/// The minute is floored to a multiple of `interval_minutes` counted from the
/// top of the hour; seconds and sub-seconds are dropped. Widths that do not
/// divide 60 restart at every hour (a 7 minute width yields a short
/// `:56` bucket), and widths above 60 collapse to hourly buckets.
pub fn bucket_start(timestamp: DateTime<Utc>, interval_minutes: u32) -> DateTime<Utc> {
    let interval = interval_minutes.max(1);
    let excess = i64::from(timestamp.minute() % interval) * 60 + i64::from(timestamp.second());
    timestamp.trunc_subsecs(0) - Duration::seconds(excess)
}

/// Aggregation bucket `[start, start + interval)`; the candle grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub interval_minutes: u32,
}

impl Bucket {
    pub fn containing(timestamp: DateTime<Utc>, interval_minutes: u32) -> Self {
        Self {
            start: bucket_start(timestamp, interval_minutes),
            interval_minutes: interval_minutes.max(1),
        }
    }
}
