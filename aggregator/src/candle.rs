//! OHLC candles over resident memory samples

use crate::bucket::Bucket;
use crate::identity::SeriesKey;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Candles per series, each vector ascending by bucket start.
pub type SeriesCandles = BTreeMap<SeriesKey, Vec<Candle>>;

/// One resolved reading waiting to be reduced into a candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub timestamp: DateTime<Utc>,
    pub rss_kb: u64,
}

/// Memory OHLC for one series over one bucket, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candle {
    pub start: DateTime<Utc>,
    pub open: u64,
    pub high: u64,
    pub low: u64,
    pub close: u64,
    pub samples: usize,
}

impl Candle {
    fn opening(start: DateTime<Utc>, rss_kb: u64) -> Self {
        Self {
            start,
            open: rss_kb,
            high: rss_kb,
            low: rss_kb,
            close: rss_kb,
            samples: 1,
        }
    }

    fn push(&mut self, rss_kb: u64) {
        self.high = self.high.max(rss_kb);
        self.low = self.low.min(rss_kb);
        self.close = rss_kb;
        self.samples += 1;
    }

    /// Reduce one bucket's points. Points are re-sorted by timestamp first;
    /// equal timestamps keep their input order. Returns `None` for an empty
    /// group so gaps stay gaps.
    pub fn build(start: DateTime<Utc>, points: &mut [Point]) -> Option<Self> {
        points.sort_by_key(|p| p.timestamp);
        let (first, rest) = points.split_first()?;
        let mut candle = Self::opening(start, first.rss_kb);
        for point in rest {
            candle.push(point.rss_kb);
        }
        Some(candle)
    }
}

/// Groups resolved samples by (bucket, series) and reduces each group.
#[derive(Debug)]
pub struct CandleBuilder {
    interval_minutes: u32,
    groups: HashMap<(Bucket, SeriesKey), Vec<Point>>,
}

impl CandleBuilder {
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes: interval_minutes.max(1),
            groups: HashMap::new(),
        }
    }

    pub fn push(&mut self, key: SeriesKey, timestamp: DateTime<Utc>, rss_kb: u64) {
        let bucket = Bucket::containing(timestamp, self.interval_minutes);
        self.groups
            .entry((bucket, key))
            .or_default()
            .push(Point { timestamp, rss_kb });
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn finish(self) -> SeriesCandles {
        let mut series = SeriesCandles::new();
        for ((bucket, key), mut points) in self.groups {
            if let Some(candle) = Candle::build(bucket.start, &mut points) {
                series.entry(key).or_default().push(candle);
            }
        }
        for candles in series.values_mut() {
            candles.sort_by_key(|c| c.start);
        }
        series
    }
}
