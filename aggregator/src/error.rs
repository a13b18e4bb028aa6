//! Error types for the aggregation engine

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("interval must be at least one minute, got {0}")]
    InvalidInterval(u32),

    #[error("malformed date {value:?} (expected YYYY-MM-DD HH:MM:SS): {source}")]
    MalformedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("start {start} must be before end {end}")]
    InvertedWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("invalid snapshot timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("cannot read data directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
