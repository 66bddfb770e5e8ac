//! Presentation helpers.
//!
//! Everything that turns engine values into what a user reads lives here:
//! two-decimal prices, the `mm:ss` countdown, chart labels, the total cost
//! including the network fee, and slot numbers with thousands separators.
//! The engine itself never rounds for display.

use chrono::{DateTime, Utc};
use chronos_types::round_price;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fixed network fee added to every bid, in SOL.
pub const NETWORK_FEE: Decimal = Decimal::from_parts(5, 0, 0, false, 6);

/// Decimal places shown for the total cost.
pub const TOTAL_COST_DECIMALS: u32 = 6;

/// Price rounded to two decimals, e.g. `6.00`.
pub fn format_price(price: Decimal) -> String {
    round_price(price).to_string()
}

/// Countdown as zero-padded `mm:ss`.
pub fn format_countdown(time_remaining_ms: u64) -> String {
    let total_secs = time_remaining_ms / 1_000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Elapsed-time chart label as `m:ss`.
pub fn format_elapsed(elapsed_secs: u64) -> String {
    format!("{}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

/// Price plus [`NETWORK_FEE`] at full precision.
pub fn total_cost(price: Decimal) -> Decimal {
    price.saturating_add(NETWORK_FEE)
}

/// Total cost rounded to six decimals, e.g. `6.000005`.
pub fn format_total_cost(price: Decimal) -> String {
    let mut cost = total_cost(price).round_dp_with_strategy(
        TOTAL_COST_DECIMALS,
        RoundingStrategy::MidpointAwayFromZero,
    );
    cost.rescale(TOTAL_COST_DECIMALS);
    cost.to_string()
}

/// Slot number with comma thousands separators, e.g. `600,000,001`.
pub fn format_slot(slot: u64) -> String {
    let digits = slot.to_string();
    let mut out = String::with_capacity(digits.len().saturating_add(digits.len() / 3));
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && digits.len().saturating_sub(index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Bid submission time as `HH:MM:SS.mmm` UTC, or `--` when out of range.
pub fn format_bid_time(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms).map_or_else(
        || "--".to_owned(),
        |at| at.format("%H:%M:%S%.3f").to_string(),
    )
}
