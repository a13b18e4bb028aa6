//! Wide-format TSV output: one row per bucket, four columns per series

use crate::candle::{Candle, SeriesCandles};
use crate::identity::{IdentityResolver, SeriesKey};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const UNKNOWN_COMMAND: &str = "unknown";

/// File naming for the table and its companion mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNaming {
    pub table_suffix: String,
    pub mapping_suffix: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            table_suffix: ".tsv".to_string(),
            mapping_suffix: "_pid_mapping.tsv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub table: PathBuf,
    pub mapping: PathBuf,
}

impl OutputNaming {
    /// `report` becomes `report.tsv` + `report_pid_mapping.tsv`; a path
    /// already ending in the table suffix is kept as is.
    pub fn paths(&self, output: &Path) -> OutputFiles {
        let requested = output.to_string_lossy().into_owned();
        let base = requested
            .strip_suffix(self.table_suffix.as_str())
            .unwrap_or(requested.as_str());
        OutputFiles {
            table: PathBuf::from(format!("{}{}", base, self.table_suffix)),
            mapping: PathBuf::from(format!("{}{}", base, self.mapping_suffix)),
        }
    }
}

/// Dense time × series view over a set of candles.
#[derive(Debug)]
pub struct PivotTable<'a> {
    times: Vec<DateTime<Utc>>,
    series: Vec<SeriesKey>,
    candles: &'a SeriesCandles,
}

impl<'a> PivotTable<'a> {
    pub fn new(candles: &'a SeriesCandles) -> Self {
        let times: BTreeSet<DateTime<Utc>> = candles
            .values()
            .flat_map(|series| series.iter().map(|c| c.start))
            .collect();
        let series = candles
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(key, _)| *key)
            .collect();
        Self {
            times: times.into_iter().collect(),
            series,
            candles,
        }
    }

    /// Distinct bucket starts across all series, ascending.
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Series with data, by raw PID then lineage.
    pub fn series(&self) -> &[SeriesKey] {
        &self.series
    }

    pub fn cell(&self, key: &SeriesKey, time: DateTime<Utc>) -> Option<&'a Candle> {
        let list = self.candles.get(key)?;
        list.binary_search_by_key(&time, |c| c.start)
            .ok()
            .map(|index| &list[index])
    }

    pub fn render_table(&self) -> String {
        let mut lines = Vec::with_capacity(self.times.len() + 1);

        let mut header = vec!["time".to_string()];
        for key in &self.series {
            header.push(format!("{}_open", key));
            header.push(format!("{}_high", key));
            header.push(format!("{}_low", key));
            header.push(format!("{}_close", key));
        }
        lines.push(header.join("\t"));

        for &time in &self.times {
            let mut row = vec![time.format(TIME_FORMAT).to_string()];
            for key in &self.series {
                match self.cell(key, time) {
                    Some(c) => {
                        row.push(c.open.to_string());
                        row.push(c.high.to_string());
                        row.push(c.low.to_string());
                        row.push(c.close.to_string());
                    }
                    None => row.extend(std::iter::repeat(String::new()).take(4)),
                }
            }
            lines.push(row.join("\t"));
        }

        lines.join("\n")
    }

    /// Series key to the latest command recorded for its raw PID.
    pub fn render_mapping(&self, resolver: &IdentityResolver) -> String {
        let mut lines = Vec::with_capacity(self.series.len() + 1);
        lines.push("PID\tCOMMAND".to_string());
        for key in &self.series {
            let cmd = resolver.command_for(key.pid()).unwrap_or(UNKNOWN_COMMAND);
            lines.push(format!("{}\t{}", key, cmd));
        }
        lines.join("\n")
    }

    /// Write the table and the mapping. Each file is replaced via a sibling
    /// temporary file; the two files are not replaced together.
    pub fn write(
        &self,
        output: &Path,
        naming: &OutputNaming,
        resolver: &IdentityResolver,
    ) -> Result<OutputFiles> {
        let files = naming.paths(output);
        replace_file(&files.table, &self.render_table())?;
        replace_file(&files.mapping, &self.render_mapping(resolver))?;
        Ok(files)
    }
}

fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let mut staging = path.as_os_str().to_os_string();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    let written = fs::write(&staging, contents).and_then(|_| fs::rename(&staging, path));
    if let Err(source) = written {
        let _ = fs::remove_file(&staging);
        return Err(Error::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    debug!("Wrote {:?} ({} bytes)", path, contents.len());
    Ok(())
}
