//! Time window selection for an aggregation run
//!
//! Windows are expressed in the sampler's local wall-clock time, the same
//! clock used to name snapshot files.

use crate::{Error, Result};
use chrono::{Duration, NaiveDateTime};

/// Format accepted for explicit `--range` bounds.
pub const RANGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Closed interval `[start, end]` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(Error::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn last_hours(now: NaiveDateTime, hours: u32) -> Result<Self> {
        Self::looking_back(now, Duration::hours(i64::from(hours)))
    }

    pub fn last_days(now: NaiveDateTime, days: u32) -> Result<Self> {
        Self::looking_back(now, Duration::days(i64::from(days)))
    }

    /// Clamped to the earliest representable date.
    fn looking_back(now: NaiveDateTime, span: Duration) -> Result<Self> {
        let start = now.checked_sub_signed(span).unwrap_or(NaiveDateTime::MIN);
        Self::new(start, now)
    }

    /// Both bounds are parsed before their order is checked.
    pub fn parse_range(start: &str, end: &str) -> Result<Self> {
        let start = parse_bound(start)?;
        let end = parse_bound(end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Inclusive at both ends.
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time <= self.end
    }
}

fn parse_bound(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), RANGE_FORMAT).map_err(|source| {
        Error::MalformedDate {
            value: value.to_string(),
            source,
        }
    })
}
