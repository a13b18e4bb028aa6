//! Configuration management (TOML)

use crate::pivot::OutputNaming;
use crate::source::DEFAULT_PREFIX;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub output: OutputNaming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub data_dir: PathBuf,
    pub interval_minutes: u32,
    pub file_prefix: String,
    /// Series listed by the verbose top-consumers summary.
    pub top_count: usize,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        AggregateConfig {
            data_dir: PathBuf::from("./output"),
            interval_minutes: 15,
            file_prefix: DEFAULT_PREFIX.to_string(),
            top_count: 10,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.aggregate.interval_minutes == 0 {
            return Err(Error::InvalidInterval(0));
        }
        if self.aggregate.file_prefix.is_empty() {
            return Err(Error::Config("aggregate.file_prefix must not be empty".into()));
        }
        if self.output.table_suffix.is_empty() || self.output.mapping_suffix.is_empty() {
            return Err(Error::Config("output suffixes must not be empty".into()));
        }
        if self.output.table_suffix == self.output.mapping_suffix {
            return Err(Error::Config(
                "output.mapping_suffix must differ from output.table_suffix".into(),
            ));
        }
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "memtrend")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
