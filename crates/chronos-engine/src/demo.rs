//! Demo bidder and status reporter.
//!
//! With no presentation layer attached, the engine drives the auction
//! itself: it connects a simulated wallet, places bids on a fixed cadence
//! with some randomness, and logs a status line the way the countdown panel
//! would show it. The loop ends when the auction executes.

use std::time::Duration;

use chronos_core::AuctionHandle;
use chronos_core::display::{
    format_countdown, format_elapsed, format_price, format_slot, format_total_cost,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Demo bidder configuration, read from the `demo` section of
/// `chronos-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Whether the engine connects a wallet and bids on its own.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Milliseconds between bid opportunities.
    #[serde(default = "default_bid_interval_ms")]
    pub bid_interval_ms: u64,

    /// Chance, in percent, that an opportunity turns into a bid.
    #[serde(default = "default_bid_chance_percent")]
    pub bid_chance_percent: u32,

    /// Milliseconds between status log lines.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bid_interval_ms: default_bid_interval_ms(),
            bid_chance_percent: default_bid_chance_percent(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

impl DemoConfig {
    /// Extract the `demo` section from a full configuration document.
    ///
    /// A missing section yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, EngineError> {
        let raw: serde_yml::Value =
            serde_yml::from_str(contents).map_err(|e| EngineError::Demo {
                message: format!("failed to parse config YAML: {e}"),
            })?;

        let Some(demo_value) = raw.get("demo") else {
            return Ok(Self::default());
        };

        let config: Self =
            serde_yml::from_value(demo_value.clone()).map_err(|e| EngineError::Demo {
                message: format!("failed to parse demo config: {e}"),
            })?;

        if config.bid_interval_ms == 0 || config.status_interval_ms == 0 {
            return Err(EngineError::Demo {
                message: String::from("demo intervals must be at least 1ms"),
            });
        }
        Ok(config)
    }
}

const fn default_enabled() -> bool {
    true
}

const fn default_bid_interval_ms() -> u64 {
    20_000
}

const fn default_bid_chance_percent() -> u32 {
    70
}

const fn default_status_interval_ms() -> u64 {
    5_000
}

// -----------------------------------------------------------------------
// Driver
// -----------------------------------------------------------------------

/// Drive the auction until it executes.
///
/// Returns early only if the coordinator goes away.
pub async fn drive(handle: &AuctionHandle, config: &DemoConfig) -> Result<(), EngineError> {
    let mut rng = SmallRng::from_os_rng();
    let chance = config.bid_chance_percent.min(100);
    let mut market = handle.subscribe_market();

    if config.enabled {
        let wallet = handle.connect_wallet().await?;
        info!(wallet = %wallet, "Demo wallet connected");
    }

    let mut status = tokio::time::interval(Duration::from_millis(config.status_interval_ms));
    status.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut bids = tokio::time::interval(Duration::from_millis(config.bid_interval_ms));
    bids.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if market.borrow_and_update().phase.is_terminal() {
            break;
        }

        tokio::select! {
            changed = market.changed() => {
                if changed.is_err() {
                    debug!("Market channel closed");
                    break;
                }
            }
            _ = status.tick() => log_status(handle),
            _ = bids.tick(), if config.enabled => {
                if !rng.random_ratio(chance, 100) {
                    debug!("Demo bidder skipped this opportunity");
                    continue;
                }
                match handle.submit_bid().await? {
                    Some(bid) => info!(
                        bid_id = %bid.id(),
                        price = %bid.price(),
                        total_cost = %format_total_cost(bid.price()),
                        slot = %format_slot(bid.slot()),
                        "Demo bid placed"
                    ),
                    None => debug!("Demo bid ignored"),
                }
            }
        }
    }

    log_status(handle);
    Ok(())
}

/// Log one status line with the countdown panel's figures and the latest
/// chart sample.
pub fn log_status(handle: &AuctionHandle) {
    let state = handle.state();
    let bids = handle.subscribe_ledger().borrow().len();
    let chart = handle.subscribe_history().borrow().last().map_or_else(
        || "--".to_owned(),
        |point| format!("{} @ {}", format_price(point.price), format_elapsed(point.elapsed_secs)),
    );
    info!(
        phase = %state.phase,
        slot = %format_slot(state.current_slot),
        slots_remaining = state.slots_remaining(),
        price = %format_price(state.current_price),
        countdown = %format_countdown(state.time_remaining_ms),
        bids,
        chart = %chart,
        "Auction status"
    );
}
