//! One aggregation run: load, resolve identities, bucket, reduce

use crate::candle::{CandleBuilder, SeriesCandles};
use crate::identity::{IdentityResolver, SeriesKey};
use crate::pivot::{OutputFiles, OutputNaming, PivotTable, UNKNOWN_COMMAND};
use crate::source::{SnapshotRecord, SnapshotSource};
use crate::window::TimeWindow;
use crate::{Error, Result};
use tracing::info;

/// Counters gathered over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub files_discovered: usize,
    pub records_loaded: usize,
    pub records_skipped: usize,
    pub samples: usize,
    pub groups: usize,
    pub series: usize,
    pub time_points: usize,
}

/// A series ranked by the close of its latest candle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopConsumer {
    pub key: SeriesKey,
    pub rss_kb: u64,
    pub command: String,
}

/// Everything one run produced. The resolver is kept for the mapping file.
#[derive(Debug)]
pub struct Aggregation {
    pub candles: SeriesCandles,
    pub resolver: IdentityResolver,
    pub report: AggregationReport,
}

impl Aggregation {
    /// Build candles from already-loaded records.
    ///
    /// Records are put in timestamp order (ties by origin) before any
    /// identity is resolved, since suffix assignment depends on order.
    pub fn from_records(mut records: Vec<SnapshotRecord>, interval_minutes: u32) -> Result<Self> {
        if interval_minutes == 0 {
            return Err(Error::InvalidInterval(interval_minutes));
        }
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.origin.cmp(&b.origin))
        });

        let mut resolver = IdentityResolver::new();
        let mut builder = CandleBuilder::new(interval_minutes);
        let mut samples = 0;
        for record in &records {
            for sample in record.samples() {
                let key = resolver.resolve(sample.pid, &sample.cmd);
                builder.push(key, sample.timestamp, sample.rss_kb);
                samples += 1;
            }
        }

        let groups = builder.group_count();
        let candles = builder.finish();
        let time_points = PivotTable::new(&candles).times().len();
        let report = AggregationReport {
            records_loaded: records.len(),
            samples,
            groups,
            series: candles.len(),
            time_points,
            ..AggregationReport::default()
        };

        Ok(Self {
            candles,
            resolver,
            report,
        })
    }

    /// True when no sample fell inside the window.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn pivot(&self) -> PivotTable<'_> {
        PivotTable::new(&self.candles)
    }

    /// Write the table and mapping. An empty aggregation touches no files and
    /// returns `None`.
    pub fn write(
        &self,
        output: &std::path::Path,
        naming: &OutputNaming,
    ) -> Result<Option<OutputFiles>> {
        if self.is_empty() {
            return Ok(None);
        }
        self.pivot().write(output, naming, &self.resolver).map(Some)
    }

    /// Largest consumers at their most recent bucket, biggest first.
    pub fn top_consumers(&self, limit: usize) -> Vec<TopConsumer> {
        let mut latest: Vec<TopConsumer> = self
            .candles
            .iter()
            .filter_map(|(key, candles)| {
                let last = candles.last()?;
                Some(TopConsumer {
                    key: *key,
                    rss_kb: last.close,
                    command: self
                        .resolver
                        .command_for(key.pid())
                        .unwrap_or(UNKNOWN_COMMAND)
                        .to_string(),
                })
            })
            .collect();
        latest.sort_by(|a, b| b.rss_kb.cmp(&a.rss_kb).then_with(|| a.key.cmp(&b.key)));
        latest.truncate(limit);
        latest
    }
}

/// Runs aggregations against one snapshot source.
#[derive(Debug)]
pub struct Aggregator<S> {
    source: S,
    interval_minutes: u32,
}

impl<S: SnapshotSource> Aggregator<S> {
    pub fn new(source: S, interval_minutes: u32) -> Result<Self> {
        if interval_minutes == 0 {
            return Err(Error::InvalidInterval(interval_minutes));
        }
        Ok(Self {
            source,
            interval_minutes,
        })
    }

    pub fn run(&self, window: &TimeWindow) -> Result<Aggregation> {
        info!(
            "Aggregating {} .. {} in {} minute buckets",
            window.start(),
            window.end(),
            self.interval_minutes
        );

        let outcome = self.source.load(window)?;
        info!(
            "Loaded {} snapshots ({} skipped)",
            outcome.records.len(),
            outcome.skipped
        );

        let mut aggregation = Aggregation::from_records(outcome.records, self.interval_minutes)?;
        aggregation.report.files_discovered = outcome.discovered;
        aggregation.report.records_skipped = outcome.skipped;

        let report = &aggregation.report;
        info!(
            "{} samples in {} groups, {} series over {} time points",
            report.samples, report.groups, report.series, report.time_points
        );
        Ok(aggregation)
    }
}
