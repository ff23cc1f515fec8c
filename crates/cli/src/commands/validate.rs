//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DataServerConfig, QueueCapacities, ServerMode};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    mode: String,
    image_queue: usize,
    imu_queue: usize,
    attitude_queue: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    mode: config.mode.as_str().to_string(),
                    image_queue: config.queues.image,
                    imu_queue: config.queues.imu,
                    attitude_queue: config.queues.attitude,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DataServerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.mode == ServerMode::Simple && config.queues != QueueCapacities::default() {
        warnings.push("queues are ignored by the simple server".to_string());
    }

    if config.mode == ServerMode::Threaded && config.queues.imu < config.queues.image {
        warnings.push(format!(
            "queues.imu ({}) is smaller than queues.image ({}); IMU usually runs at a higher rate",
            config.queues.imu, config.queues.image
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Mode: {}", summary.mode);
            println!("  Image queue: {}", summary.image_queue);
            println!("  IMU queue: {}", summary.imu_queue);
            println!("  Attitude queue: {}", summary.attitude_queue);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(content: &str) -> (tempfile::NamedTempFile, ValidateArgs) {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        (file, args)
    }

    #[test]
    fn test_valid_config_has_summary() {
        let (_file, args) = args_for("mode = \"threaded\"\n[queues]\nimage = 4\nimu = 40\nattitude = 40\n");
        let result = validate_config(&args);
        assert!(result.valid);
        assert!(result.warnings.is_none());
        assert_eq!(result.summary.unwrap().image_queue, 4);
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let (_file, args) = args_for("[queues]\nimage = 0\n");
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("queues.image"));
        assert!(run_validate(&args).is_err());
    }

    #[test]
    fn test_simple_mode_with_queues_warns() {
        let (_file, args) = args_for("mode = \"simple\"\n[queues]\nimage = 2\n");
        let result = validate_config(&args);
        assert!(result.valid);
        assert_eq!(result.warnings.unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/dataserver.toml".into(),
            json: false,
        };
        assert!(!validate_config(&args).valid);
    }
}
