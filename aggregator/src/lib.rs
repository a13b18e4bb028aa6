//! Rebuilds per-process memory history into pivoted OHLC time series.
//!
//! A run loads snapshot records for a time window, resolves each raw
//! (pid, command) pair to a [`identity::SeriesKey`] that survives PID reuse,
//! buckets samples into fixed-width intervals, reduces every bucket to a
//! [`candle::Candle`], and writes a wide TSV table plus a PID-to-command
//! mapping.

pub mod bucket;
pub mod candle;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod pivot;
pub mod source;
pub mod window;

pub use error::{Error, Result};
