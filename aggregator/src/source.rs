//! Snapshot records and the sources that supply them

mod directory;

pub use directory::{parse_snapshot, DirectorySource, DEFAULT_PREFIX};

use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One process reading inside a snapshot, as written by the sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub pid: u32,
    #[serde(default)]
    pub cmd: String,
    /// Resident set size in kilobytes.
    #[serde(default)]
    pub rss: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// One point-in-time snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// Where the record came from (file name for directory sources). Breaks
    /// ties between records carrying the same timestamp.
    pub origin: String,
    pub timestamp: DateTime<Utc>,
    pub hostname: Option<String>,
    pub items: Vec<SnapshotItem>,
    pub total_mb: Option<f64>,
}

/// A single observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub cmd: String,
    pub rss_kb: u64,
}

impl SnapshotRecord {
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.items.iter().map(move |item| Sample {
            timestamp: self.timestamp,
            pid: item.pid,
            cmd: item.cmd.clone(),
            rss_kb: item.rss,
        })
    }
}

/// Result of loading one window.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<SnapshotRecord>,
    /// Units in the window that were considered.
    pub discovered: usize,
    /// Units dropped because they could not be read or parsed.
    pub skipped: usize,
}

pub trait SnapshotSource {
    /// Load every readable record inside `window`. Unreadable units are
    /// skipped with a warning; only failures that prevent enumeration are
    /// returned as errors.
    fn load(&self, window: &TimeWindow) -> crate::Result<LoadOutcome>;
}
