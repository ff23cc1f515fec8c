//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::ServerMode;
use std::path::PathBuf;

/// dataserver - time-ordered merge of image, IMU and attitude streams
#[derive(Parser, Debug)]
#[command(
    name = "dataserver",
    author,
    version,
    about = "Time-ordered measurement data server",
    long_about = "Merges image, IMU and attitude streams into one time-ordered feed.\n\n\
                  The `run` command drives a synthetic source through the configured \n\
                  data server and reports merge statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DATASERVER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DATASERVER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge a synthetic source through the data server
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "DATASERVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the server mode from configuration
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Override every queue capacity from configuration
    #[arg(long)]
    pub queue_size: Option<usize>,

    /// Camera rate (Hz)
    #[arg(long, default_value = "20")]
    pub image_hz: f64,

    /// IMU rate (Hz)
    #[arg(long, default_value = "200")]
    pub imu_hz: f64,

    /// Attitude rate (Hz)
    #[arg(long, default_value = "100")]
    pub attitude_hz: f64,

    /// Span of the synthetic streams (seconds)
    #[arg(long, default_value = "10")]
    pub duration: f64,

    /// Uniform stamp jitter bound (milliseconds)
    #[arg(long, default_value = "0")]
    pub jitter_ms: f64,

    /// Seed for the jitter generator
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Simulated source latency per fetch (milliseconds)
    #[arg(long, default_value = "0", env = "DATASERVER_IO_DELAY_MS")]
    pub io_delay_ms: u64,

    /// Stop after this many measurements (0 = drain everything)
    #[arg(long, default_value = "0")]
    pub max_measurements: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DATASERVER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Output merge summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dataserver.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dataserver.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Server mode selectable on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    /// Single-slot server on the caller's thread
    Simple,
    /// Background worker with bounded queues
    Threaded,
}

impl From<ModeArg> for ServerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Simple => ServerMode::Simple,
            ModeArg::Threaded => ServerMode::Threaded,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
