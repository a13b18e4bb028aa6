use super::{LoadOutcome, SnapshotItem, SnapshotRecord, SnapshotSource};
use crate::window::TimeWindow;
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_PREFIX: &str = "memory_";
const EXTENSION: &str = ".json";
const FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Items are decoded one by one; a bad item never discards its snapshot.
#[derive(Deserialize)]
struct RawSnapshot {
    timestamp: String,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    total_mb: Option<f64>,
}

/// Reads `{prefix}YYYYMMDD_HHMMSS.json` snapshot files from one directory.
///
/// The directory is listed once per `load`; files the sampler creates after
/// that are not seen, and files that disappear or are still half-written
/// when read are skipped like any other malformed unit.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    prefix: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sampler-local time encoded in a snapshot file name. `None` when the
    /// name is not a snapshot file at all.
    pub fn file_time(&self, name: &str) -> Option<std::result::Result<NaiveDateTime, chrono::ParseError>> {
        let stem = name.strip_prefix(&self.prefix)?.strip_suffix(EXTENSION)?;
        Some(NaiveDateTime::parse_from_str(stem, FILE_TIME_FORMAT))
    }

    fn read_record(&self, path: &Path, origin: &str) -> Result<SnapshotRecord> {
        let content = fs::read_to_string(path)?;
        parse_snapshot(origin, &content)
    }
}

impl SnapshotSource for DirectorySource {
    fn load(&self, window: &TimeWindow) -> Result<LoadOutcome> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Data directory {:?} does not exist", self.dir);
                return Ok(LoadOutcome::default());
            }
            Err(source) => {
                return Err(Error::ReadDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut outcome = LoadOutcome::default();
        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            match self.file_time(&name) {
                None => {}
                Some(Err(e)) => {
                    warn!("Skipping {}: unreadable time in file name: {}", name, e);
                    outcome.discovered += 1;
                    outcome.skipped += 1;
                }
                Some(Ok(time)) if window.contains(time) => {
                    candidates.push((name, entry.path()));
                }
                Some(Ok(_)) => debug!("{} is outside the window", name),
            }
        }

        // Listing order is unspecified; names sort chronologically.
        candidates.sort();
        outcome.discovered += candidates.len();

        for (name, path) in candidates {
            match self.read_record(&path, &name) {
                Ok(record) => {
                    debug!("Loaded {} ({} items)", name, record.items.len());
                    outcome.records.push(record);
                }
                Err(e) => {
                    warn!("Skipping snapshot {:?}: {}", path, e);
                    outcome.skipped += 1;
                }
            }
        }

        Ok(outcome)
    }
}

/// Parse one snapshot body. Malformed items are dropped with a warning; a
/// malformed body or timestamp fails the whole record.
pub fn parse_snapshot(origin: &str, content: &str) -> Result<SnapshotRecord> {
    let raw: RawSnapshot = serde_json::from_str(content)?;
    let timestamp = parse_timestamp(&raw.timestamp)?;

    let mut items = Vec::with_capacity(raw.items.len());
    for (index, value) in raw.items.into_iter().enumerate() {
        match serde_json::from_value::<SnapshotItem>(value) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping malformed item {} in {}: {}", index, origin, e),
        }
    }

    Ok(SnapshotRecord {
        origin: origin.to_string(),
        timestamp,
        hostname: raw.hostname,
        items,
        total_mb: raw.total_mb,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| Error::Timestamp {
            value: value.to_string(),
            source,
        })
}
