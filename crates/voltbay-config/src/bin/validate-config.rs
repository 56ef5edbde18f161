//! Config validation CLI tool
//!
//! Validates a voltbay station configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use voltbay_config::{ConfigError, CountdownPolicy, CURRENT_CONFIG_VERSION};
use voltbay_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a voltbay station configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match voltbay_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Station: {}", config.station.name);
            println!("  Data directory: {}", config.station.data_dir.display());
            println!("  Tick interval: {:?}", config.station.tick_interval);
            let countdown = match config.station.countdown {
                CountdownPolicy::PerTick => "per tick",
                CountdownPolicy::WallClock => "wall clock",
            };
            println!("  Countdown: {}", countdown);
            println!(
                "  Durations: {} / {} / {} min",
                config.durations.short, config.durations.medium, config.durations.long
            );
            println!("  Default user codes: {}", config.default_user_codes.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
