//! accel-metrics - derived metrics for tri-axial acceleration streams
//!
//! Records one session from a sample source, deriving velocity, power,
//! magnitudes, current and voltage for every tick.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in synthetic samples
//! cargo run --release
//!
//! # Read JSON samples from stdin
//! ./accel-simulation --seed 7 | ./accel-metrics --stdin --emit-records
//!
//! # Override parameters on the command line
//! ./accel-metrics --param Mass=2.5 --param Resistance=0.25
//! ```
//!
//! # Environment Variables
//!
//! - `ACCEL_METRICS_CONFIG`: Path to the TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use accel_metrics::config::defaults::{
    CONFIG_ENV_VAR, CONFIG_EVENT_CAPACITY, LOCAL_CONFIG_FILE, SIMULATION_DEFAULT_SAMPLES,
};
use accel_metrics::config::watcher::run_config_watcher;
use accel_metrics::config::{AppConfig, ConfigKey, Configuration};
use accel_metrics::pipeline::{
    JsonLinesSink, PipelineOutcome, ProcessingLoop, RecordSink, ReplaySource, SampleSource,
    StdinSource,
};
use accel_metrics::synthetic::SyntheticFeed;
use accel_metrics::types::Record;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "accel-metrics")]
#[command(about = "Incremental derived metrics for tri-axial acceleration samples")]
#[command(version)]
struct CliArgs {
    /// Read JSON samples from stdin instead of the synthetic feed
    #[arg(long)]
    stdin: bool,

    /// Path to the TOML config file (overrides $ACCEL_METRICS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parameter override, e.g. `--param Mass=2.5` (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    params: Vec<(ConfigKey, f64)>,

    /// Number of synthetic samples (ignored with --stdin)
    #[arg(long, default_value_t = SIMULATION_DEFAULT_SAMPLES)]
    samples: u64,

    /// Seed for the synthetic feed
    #[arg(long)]
    seed: Option<u64>,

    /// Pacing of the synthetic feed (1 = realtime, 10 = 10x faster, 0 = no delay)
    #[arg(long, default_value = "0")]
    speed: u64,

    /// Write every record to stdout as a JSON line
    #[arg(long)]
    emit_records: bool,

    /// Reload parameters when the config file changes
    #[arg(long)]
    watch_config: bool,
}

fn parse_param(raw: &str) -> Result<(ConfigKey, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    let key = name.parse::<ConfigKey>().map_err(|_| {
        format!(
            "unknown parameter '{name}' (expected one of: {})",
            ConfigKey::all_names().collect::<Vec<_>>().join(", ")
        )
    })?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((key, value))
}

// ============================================================================
// Startup
// ============================================================================

impl CliArgs {
    /// `--param` values as an override set.
    fn cli_overrides(&self) -> Configuration {
        let mut overrides = Configuration::new();
        for &(key, value) in &self.params {
            overrides.set(key, value);
        }
        overrides
    }
}

/// Config file to watch: `--config`, then an existing `$ACCEL_METRICS_CONFIG`,
/// then the local file. Mirrors the search order of [`AppConfig::load`].
fn config_path(explicit: Option<&Path>, from_env: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| from_env.filter(|path| path.exists()))
        .or_else(|| {
            let local = PathBuf::from(LOCAL_CONFIG_FILE);
            local.exists().then_some(local)
        })
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut app = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load(),
    };

    app.parameters = app.parameters.layered_with(&args.cli_overrides());
    if !args.params.is_empty() {
        app.validate().context("validating command-line parameters")?;
    }
    if args.emit_records {
        app.session.emit_records = true;
    }
    Ok(app)
}

fn synthetic_source(args: &CliArgs, config: &Configuration) -> ReplaySource {
    let step_time = config.step_time();
    let samples: Vec<_> = SyntheticFeed::new(step_time, args.seed)
        .take(usize::try_from(args.samples).unwrap_or(usize::MAX))
        .collect();
    ReplaySource::new(samples, pacing_delay_ms(step_time, args.speed))
}

/// Delay between synthetic samples; speed 0 means as fast as possible.
/// Sub-millisecond pacing rounds down to no delay, and the cast saturates.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn pacing_delay_ms(step_time: f64, speed: u64) -> u64 {
    if speed == 0 {
        0
    } else {
        (step_time * 1000.0 / speed as f64) as u64
    }
}

/// Settings shared by every source/sink combination.
struct RunOptions {
    cancel_token: CancellationToken,
    watch_path: Option<PathBuf>,
    /// Re-applied over each reloaded config file
    cli_overrides: Configuration,
}

async fn record<S: SampleSource, K: RecordSink>(
    config: Configuration,
    sink: K,
    source: &mut S,
    options: RunOptions,
) -> PipelineOutcome {
    let mut pipeline = ProcessingLoop::new(config, sink, options.cancel_token);

    if let Some(path) = options.watch_path {
        let (tx, rx) = mpsc::channel(CONFIG_EVENT_CAPACITY);
        tokio::spawn(run_config_watcher(path, tx));
        pipeline = pipeline
            .with_config_events(rx)
            .with_pinned_overrides(options.cli_overrides);
    }

    pipeline.run(source).await
}

fn format_record(record: &Record, precision: usize) -> String {
    Record::COLUMNS
        .iter()
        .zip(record.values())
        .map(|(name, value)| format!("{name}={value:.precision$}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn log_summary(outcome: &PipelineOutcome, config: &Configuration) {
    let stats = &outcome.stats;
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        samples = stats.samples_ingested,
        non_finite = stats.non_finite_records,
        config_reloads = stats.config_reloads,
        stop = ?stats.stop_reason,
        "Session complete"
    );
    info!(
        duration_secs = outcome.log.duration(),
        chart_window = outcome.log.trailing_window(config.chart_length()).len(),
        "Session log"
    );
    if let Some(last) = outcome.log.last() {
        info!("Final record: {}", format_record(last, config.table_value_length()));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let app = load_config(&args)?;
    let config = app.parameters.clone();

    info!(label = %app.session.label, "accel-metrics starting");

    let watch_path = if args.watch_config {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let path = config_path(args.config.as_deref(), from_env);
        if path.is_none() {
            warn!("--watch-config given but no config file found, hot reload disabled");
        }
        path
    } else {
        None
    };

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, stopping session...");
        shutdown_token.cancel();
    });

    let options = RunOptions {
        cancel_token,
        watch_path,
        cli_overrides: args.cli_overrides(),
    };

    let outcome = match (args.stdin, app.session.emit_records) {
        (true, true) => {
            let sink = JsonLinesSink::new(std::io::stdout());
            record(config.clone(), sink, &mut StdinSource::new(), options).await
        }
        (true, false) => record(config.clone(), (), &mut StdinSource::new(), options).await,
        (false, emit) => {
            let mut source = synthetic_source(&args, &config);
            if emit {
                let sink = JsonLinesSink::new(std::io::stdout());
                record(config.clone(), sink, &mut source, options).await
            } else {
                record(config.clone(), (), &mut source, options).await
            }
        }
    };

    log_summary(&outcome, &config);
    Ok(())
}
