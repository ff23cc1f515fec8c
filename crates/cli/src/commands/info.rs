//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DataServerConfig, ServerMode, StreamKind};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    mode: String,
    background_worker: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    queues: Vec<QueueInfo>,
}

#[derive(Serialize)]
struct QueueInfo {
    stream: String,
    capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)?;
    let info = build_config_info(&config);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info, &config);
    }

    Ok(())
}

fn build_config_info(config: &DataServerConfig) -> ConfigInfo {
    let threaded = config.mode == ServerMode::Threaded;
    let queues = if threaded {
        StreamKind::STREAMS
            .iter()
            .map(|&kind| QueueInfo {
                stream: kind.as_str().to_string(),
                capacity: config.queues.get(kind),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: config.mode.as_str().to_string(),
        background_worker: threaded,
        queues,
    }
}

fn print_config_info(info: &ConfigInfo, config: &DataServerConfig) {
    println!("=== Data Server Configuration ===\n");
    println!("Mode: {}", info.mode);
    println!("Background worker: {}", if info.background_worker { "yes" } else { "no" });

    if !info.queues.is_empty() {
        println!("\nQueues:");
        for queue in &info.queues {
            println!("  {:<9} capacity {}", queue.stream, queue.capacity);
        }
    }

    match config_loader::ConfigLoader::to_toml(config) {
        Ok(toml) => println!("\nEffective TOML:\n{}", toml),
        Err(e) => println!("\n(TOML rendering failed: {})", e),
    }
}
