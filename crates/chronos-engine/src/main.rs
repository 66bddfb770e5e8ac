//! Auction engine binary for the Chronos slot auction simulation.
//!
//! Wires the auction core to a process: loads configuration, starts the
//! slot clock, price engine and coordinator, drives a demo bidder until the
//! auction executes (or Ctrl-C), then logs the final report and shuts every
//! task down.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `chronos-config.yaml`
//! 3. Load the demo bidder section
//! 4. Start the auction against the system clock
//! 5. Drive the demo bidder until execution or interrupt
//! 6. Log the final report
//! 7. Shut down all tasks

mod demo;
mod error;
mod report;

use std::path::Path;
use std::sync::Arc;

use chronos_core::config::AuctionConfig;
use chronos_core::start_auction;
use chronos_core::time::SystemTimeSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::demo::DemoConfig;
use crate::error::EngineError;

/// Configuration file looked up in the current working directory.
const CONFIG_PATH: &str = "chronos-config.yaml";

/// Application entry point for the auction engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid or a task fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chronos-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        target_slot = config.slots.target_slot,
        initial_slot = config.slots.initial_slot,
        start_price = %config.pricing.start_price,
        end_price = %config.pricing.end_price,
        duration_ms = config.pricing.duration_ms,
        build_window_ms = config.pricing.build_window_ms,
        "Configuration loaded"
    );

    // 3. Load demo bidder configuration.
    let demo_config = load_demo_config()?;
    info!(
        enabled = demo_config.enabled,
        bid_interval_ms = demo_config.bid_interval_ms,
        bid_chance_percent = demo_config.bid_chance_percent,
        "Demo bidder configuration loaded"
    );

    // 4. Start the auction.
    let handle = start_auction(&config, Arc::new(SystemTimeSource)).map_err(EngineError::from)?;

    // 5. Drive until execution or interrupt.
    let interrupted = tokio::select! {
        result = demo::drive(&handle, &demo_config) => {
            result?;
            false
        }
        result = tokio::signal::ctrl_c() => {
            result.map_err(|e| EngineError::Signal {
                message: format!("failed to listen for Ctrl-C: {e}"),
            })?;
            info!("Interrupt received");
            true
        }
    };

    // 6. Final report.
    report::log_final_report(&handle).await?;

    // 7. Shut down.
    handle.shutdown().await.map_err(EngineError::from)?;

    info!(interrupted, "chronos-engine shutdown complete");
    Ok(())
}

/// Load the auction configuration from `chronos-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<AuctionConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = AuctionConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(AuctionConfig::default())
    }
}

/// Load the demo bidder configuration from `chronos-config.yaml`.
///
/// Reads the `demo` section from the YAML config file. If the file does not
/// exist or lacks the `demo` key, defaults are used.
fn load_demo_config() -> Result<DemoConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Demo {
            message: format!("failed to read config file: {e}"),
        })?;
        DemoConfig::from_yaml(&contents)
    } else {
        Ok(DemoConfig::default())
    }
}
