//! `run` command implementation.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{DataServer, DataServerConfig, Measurement, QueueCapacities, StreamKind};
use data_server::create_data_server;
use ingestion::{SyntheticConfig, SyntheticSource, ThrottledSource};
use observability::{MergeStatsAggregator, MergeSummary};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::CliError;

/// Progress log interval in measurements
const PROGRESS_EVERY: u64 = 1000;

/// Run report for JSON output
#[derive(Serialize)]
struct RunReport {
    mode: String,
    queues: QueueCapacities,
    expected: u64,
    elapsed_ms: f64,
    throughput_per_s: f64,
    fetches: FetchInfo,
    summary: MergeSummary,
}

#[derive(Serialize)]
struct FetchInfo {
    image: u64,
    imu: u64,
    attitude: u64,
    exhausted: u64,
}

/// Execute the `run` command
pub fn run_merge(args: &RunArgs) -> Result<()> {
    let config = effective_config(args)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let synthetic = SyntheticConfig {
        image_hz: args.image_hz,
        imu_hz: args.imu_hz,
        attitude_hz: args.attitude_hz,
        duration_s: args.duration,
        jitter_s: args.jitter_ms / 1000.0,
        seed: args.seed,
        ..SyntheticConfig::default()
    };
    let source = SyntheticSource::new(synthetic).context("Invalid synthetic source settings")?;
    let expected = source.total_count();

    let source = ThrottledSource::new(source, Duration::from_millis(args.io_delay_ms));
    let fetch_metrics = source.metrics();

    info!(
        mode = config.mode.as_str(),
        expected,
        io_delay_ms = args.io_delay_ms,
        "Starting merge run"
    );

    let started = Instant::now();
    let mut server = create_data_server(&config, source).context("Failed to start data server")?;
    let stats = merge(server.as_mut(), args.max_measurements)?;
    // Dropping the server stops the worker before fetch counters are read
    drop(server);
    let elapsed = started.elapsed();

    let summary = stats.summary();
    let fetches = fetch_metrics.snapshot();
    let elapsed_s = elapsed.as_secs_f64();

    info!(
        delivered = summary.total,
        elapsed_ms = elapsed_s * 1000.0,
        "Merge run finished"
    );

    if args.max_measurements == 0 && summary.total != expected {
        warn!(
            delivered = summary.total,
            expected, "Delivered count differs from generated count"
        );
    }

    if args.json {
        let report = RunReport {
            mode: config.mode.as_str().to_string(),
            queues: config.queues,
            expected,
            elapsed_ms: elapsed_s * 1000.0,
            throughput_per_s: throughput(summary.total, elapsed_s),
            fetches: FetchInfo {
                image: fetches.image_fetches,
                imu: fetches.imu_fetches,
                attitude: fetches.attitude_fetches,
                exhausted: fetches.exhausted_fetches,
            },
            summary: summary.clone(),
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        println!("Mode: {}", config.mode.as_str());
        if config.mode == contracts::ServerMode::Threaded {
            println!(
                "Queues: image={}, imu={}, attitude={}",
                config.queues.image, config.queues.imu, config.queues.attitude
            );
        }
        println!("Expected: {}", expected);
        println!(
            "Elapsed: {:.1} ms ({:.0} measurements/s)",
            elapsed_s * 1000.0,
            throughput(summary.total, elapsed_s)
        );
        println!("Source fetches: {}", fetches.total());
        println!();
        print!("{}", summary);
    }

    if summary.order_violations > 0 {
        return Err(CliError::OutOfOrder {
            violations: summary.order_violations,
        }
        .into());
    }

    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied
fn effective_config(args: &RunArgs) -> Result<DataServerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DataServerConfig::default(),
    };

    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(size) = args.queue_size {
        config.queues = QueueCapacities::uniform(size);
    }

    config_loader::ConfigLoader::validate(&config).context("Invalid command-line override")?;
    debug!(?config, "Effective configuration");
    Ok(config)
}

/// Pull measurements in order until the feed ends or `limit` is reached
///
/// `limit == 0` drains everything.
fn merge(server: &mut dyn DataServer, limit: u64) -> Result<MergeStatsAggregator> {
    let mut stats = MergeStatsAggregator::new();

    while limit == 0 || stats.total < limit {
        let measurement: Measurement = match server.next_kind() {
            StreamKind::Image => server.take_image()?.into(),
            StreamKind::Imu => server.take_imu()?.into(),
            StreamKind::Attitude => server.take_attitude()?.into(),
            StreamKind::None => break,
        };
        stats.update(&measurement);

        if stats.total % PROGRESS_EVERY == 0 {
            debug!(delivered = stats.total, span_s = stats.span_s(), "Merge progress");
        }
    }

    Ok(stats)
}

fn throughput(count: u64, elapsed_s: f64) -> f64 {
    if elapsed_s > 0.0 {
        count as f64 / elapsed_s
    } else {
        0.0
    }
}
