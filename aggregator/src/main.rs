use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{ArgGroup, Parser};
use memtrend::{
    config::Config,
    engine::Aggregator,
    pivot::OutputNaming,
    source::DirectorySource,
    window::TimeWindow,
    Error,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const COMMAND_PREVIEW_CHARS: usize = 50;

/// Aggregate process memory snapshots into OHLC time series (TSV).
///
/// Examples:
///   memtrend-aggregate --hours 24 --output memory_24h.tsv
///   memtrend-aggregate --days 7 --interval 60 --output memory_1week.tsv
///   memtrend-aggregate --range "2025-06-01 00:00:00" "2025-06-02 00:00:00" --output june1.tsv
#[derive(Parser)]
#[command(name = "memtrend-aggregate", version, about, verbatim_doc_comment)]
#[command(group(ArgGroup::new("window").required(true).args(["hours", "days", "range"])))]
struct Cli {
    /// Aggregate the last N hours
    #[arg(long)]
    hours: Option<u32>,

    /// Aggregate the last N days
    #[arg(long)]
    days: Option<u32>,

    /// Explicit window, both bounds as "YYYY-MM-DD HH:MM:SS" local time
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    range: Option<Vec<String>>,

    /// Bucket width in minutes [default: 15, or the config file value]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    interval: Option<u32>,

    /// Output TSV path; ".tsv" is appended when missing
    #[arg(short, long)]
    output: PathBuf,

    /// Snapshot directory [default: ./output, or the config file value]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log progress and the top memory consumers
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn window(&self, now: NaiveDateTime) -> memtrend::Result<TimeWindow> {
        if let Some(hours) = self.hours {
            TimeWindow::last_hours(now, hours)
        } else if let Some(days) = self.days {
            TimeWindow::last_days(now, days)
        } else {
            match self.range.as_deref() {
                Some([start, end]) => TimeWindow::parse_range(start, end),
                // clap enforces one selector with exactly two range values
                _ => unreachable!("time window selector is required"),
            }
        }
    }
}

/// Process exit codes. Usage errors exit with clap's own code 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitStatus {
    /// Finished, including "no data in range".
    Success = 0,
    /// Ctrl-C before the run finished.
    Interrupted = 1,
    /// `--config` could not be loaded.
    Config = 100,
    /// `--range` bound is not `YYYY-MM-DD HH:MM:SS`.
    MalformedDate = 108,
    /// Start is not before end.
    InvertedRange = 110,
    /// Aggregation, output, or internal failure.
    Failure = 111,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Exit status for a window that could not be built.
fn window_status(err: &Error) -> ExitStatus {
    match err {
        Error::MalformedDate { .. } => ExitStatus::MalformedDate,
        Error::InvertedWindow { .. } => ExitStatus::InvertedRange,
        _ => ExitStatus::Failure,
    }
}

/// Effective run settings: CLI flags over config file over defaults.
struct Settings {
    data_dir: PathBuf,
    interval_minutes: u32,
    file_prefix: String,
    top_count: usize,
    output: PathBuf,
    naming: OutputNaming,
    verbose: bool,
}

impl Settings {
    fn resolve(cli: Cli, config: Config) -> Self {
        Settings {
            data_dir: cli.data_dir.unwrap_or(config.aggregate.data_dir),
            interval_minutes: cli.interval.unwrap_or(config.aggregate.interval_minutes),
            file_prefix: config.aggregate.file_prefix,
            top_count: config.aggregate.top_count,
            output: cli.output,
            naming: config.output,
            verbose: cli.verbose,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitStatus::Config.into();
        }
    };

    let window = match cli.window(Local::now().naive_local()) {
        Ok(window) => window,
        Err(e) => {
            error!("{}", e);
            return window_status(&e).into();
        }
    };

    let settings = Settings::resolve(cli, config);
    if settings.verbose {
        info!(
            "Data directory {:?}, {} minute buckets, output {:?}",
            settings.data_dir, settings.interval_minutes, settings.output
        );
        info!("Window length {}", window.end() - window.start());
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build runtime: {}", e);
            return ExitStatus::Failure.into();
        }
    };
    let status = runtime.block_on(supervise(settings, window));
    // A still-running blocking job must not hold up an interrupted exit.
    runtime.shutdown_background();
    status.into()
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("loading config from {}", path.display()));
    }
    let path = Config::config_path();
    if path.exists() {
        Ok(Config::load(&path).unwrap_or_else(|e| {
            warn!("Failed to load config {:?}: {}, using defaults", path, e);
            Config::default()
        }))
    } else {
        Ok(Config::default())
    }
}

async fn supervise(settings: Settings, window: TimeWindow) -> ExitStatus {
    let job = tokio::task::spawn_blocking(move || run(&settings, &window));

    tokio::select! {
        joined = job => match joined {
            Ok(Ok(())) => ExitStatus::Success,
            Ok(Err(e)) => {
                error!("Aggregation failed: {:?}", e);
                ExitStatus::Failure
            }
            Err(e) => {
                error!("Aggregation task crashed: {}", e);
                ExitStatus::Failure
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            ExitStatus::Interrupted
        }
    }
}

fn run(settings: &Settings, window: &TimeWindow) -> Result<()> {
    let source = DirectorySource::new(&settings.data_dir).with_prefix(settings.file_prefix.as_str());
    let aggregator = Aggregator::new(source, settings.interval_minutes)?;
    let aggregation = aggregator.run(window).context("aggregating snapshots")?;

    let Some(files) = aggregation
        .write(&settings.output, &settings.naming)
        .context("writing aggregation output")?
    else {
        warn!("No data found in the requested window");
        warn!("Check the data directory {:?} and snapshot file names", settings.data_dir);
        return Ok(());
    };

    info!("Table written to {:?}", files.table);
    info!("PID mapping written to {:?}", files.mapping);
    info!(
        "{} series, {} time points",
        aggregation.report.series, aggregation.report.time_points
    );

    if settings.verbose {
        info!("Top memory consumers (latest bucket):");
        for (rank, top) in aggregation.top_consumers(settings.top_count).iter().enumerate() {
            let preview: String = top.command.chars().take(COMMAND_PREVIEW_CHARS).collect();
            info!("  {}. PID:{} RSS:{}KB CMD:{}", rank + 1, top.key, top.rss_kb, preview);
        }
    }

    Ok(())
}
