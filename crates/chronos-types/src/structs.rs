//! Core data structs for the auction simulation.
//!
//! Covers the immutable [`Bid`] record, the published [`MarketState`] and
//! [`AuctionState`] snapshots, and [`PricePoint`] samples for the price
//! chart.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::AuctionPhase;
use crate::ids::{BidId, WalletId};

/// Number of decimal places a price carries once it leaves the engine.
pub const PRICE_DECIMALS: u32 = 2;

/// Round a full-precision price to [`PRICE_DECIMALS`] places.
///
/// Uses midpoint-away-from-zero rounding (never truncation). Negative input
/// is clamped to zero; prices are never negative. The result always carries
/// exactly two decimal places (`3.5` becomes `3.50`).
pub fn round_price(price: Decimal) -> Decimal {
    let mut rounded = price
        .max(Decimal::ZERO)
        .round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_DECIMALS);
    rounded
}

// ---------------------------------------------------------------------------
// Bid
// ---------------------------------------------------------------------------

/// A bid recorded in the ledger.
///
/// Bids are immutable: every field is private and only readable through
/// accessors. A bid is created by the coordinator from ambient state (the
/// connected wallet, the current price, the current slot) and never
/// modified or removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(from = "BidRecord")]
#[ts(export, export_to = "bindings/")]
pub struct Bid {
    /// Unique bid identifier.
    id: BidId,
    /// Wallet that submitted the bid.
    wallet: WalletId,
    /// Price captured at submission, rounded to two decimals.
    #[ts(as = "String")]
    price: Decimal,
    /// Submission time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    timestamp_ms: i64,
    /// Slot observed at submission.
    #[ts(type = "number")]
    slot: u64,
}

impl Bid {
    /// Build a bid. The price is rounded with [`round_price`].
    pub fn new(id: BidId, wallet: WalletId, price: Decimal, timestamp_ms: i64, slot: u64) -> Self {
        Self {
            id,
            wallet,
            price: round_price(price),
            timestamp_ms,
            slot,
        }
    }

    /// The bid identifier.
    pub const fn id(&self) -> BidId {
        self.id
    }

    /// The submitting wallet.
    pub const fn wallet(&self) -> &WalletId {
        &self.wallet
    }

    /// The captured price (two decimals).
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Submission time in milliseconds since the Unix epoch.
    pub const fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Slot observed at submission.
    pub const fn slot(&self) -> u64 {
        self.slot
    }

    /// Submission time as a UTC datetime, if the timestamp is in range.
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Wire form of a [`Bid`]; deserialization goes through [`Bid::new`].
#[derive(Deserialize)]
struct BidRecord {
    id: BidId,
    wallet: WalletId,
    price: Decimal,
    timestamp_ms: i64,
    slot: u64,
}

impl From<BidRecord> for Bid {
    fn from(record: BidRecord) -> Self {
        Self::new(
            record.id,
            record.wallet,
            record.price,
            record.timestamp_ms,
            record.slot,
        )
    }
}

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// Output of the price engine, published every price tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketState {
    /// Current price at full precision. Frozen once the phase leaves
    /// [`AuctionPhase::Active`].
    #[ts(as = "String")]
    pub current_price: Decimal,
    /// Current auction phase.
    pub phase: AuctionPhase,
    /// Milliseconds until the decay window closes (0 outside `Active`).
    #[ts(type = "number")]
    pub time_remaining_ms: u64,
}

/// Combined auction snapshot as the presentation layer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuctionState {
    /// Slot the auction executes at.
    #[ts(type = "number")]
    pub target_slot: u64,
    /// Latest simulated slot, never above `target_slot`.
    #[ts(type = "number")]
    pub current_slot: u64,
    /// Current price at full precision.
    #[ts(as = "String")]
    pub current_price: Decimal,
    /// Current auction phase.
    pub phase: AuctionPhase,
    /// Milliseconds until the decay window closes.
    #[ts(type = "number")]
    pub time_remaining_ms: u64,
}

impl AuctionState {
    /// Assemble a snapshot from the slot and market channels.
    pub const fn from_parts(target_slot: u64, current_slot: u64, market: MarketState) -> Self {
        Self {
            target_slot,
            current_slot,
            current_price: market.current_price,
            phase: market.phase,
            time_remaining_ms: market.time_remaining_ms,
        }
    }

    /// Slots left until the target slot (saturating at zero).
    pub const fn slots_remaining(&self) -> u64 {
        self.target_slot.saturating_sub(self.current_slot)
    }
}

/// One sample of the price chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PricePoint {
    /// Whole seconds since the auction started.
    #[ts(type = "number")]
    pub elapsed_secs: u64,
    /// Price at the sample instant, rounded to two decimals.
    #[ts(as = "String")]
    pub price: Decimal,
    /// Wall-clock time of the sample in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub timestamp_ms: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn wallet() -> WalletId {
        WalletId::new("abcd...wxyz")
    }

    #[test]
    fn bid_rounds_price_half_away_from_zero() {
        let bid = Bid::new(BidId::new(), wallet(), dec!(6.005), 0, 1);
        assert_eq!(bid.price(), dec!(6.01));

        let bid = Bid::new(BidId::new(), wallet(), dec!(6.00499), 0, 1);
        assert_eq!(bid.price(), dec!(6.00));
    }

    #[test]
    fn bid_price_never_negative() {
        let bid = Bid::new(BidId::new(), wallet(), dec!(-1.5), 0, 1);
        assert_eq!(bid.price(), Decimal::ZERO);
    }

    #[test]
    fn submitted_at_converts_millis() {
        let bid = Bid::new(BidId::new(), wallet(), dec!(2), 1_700_000_000_123, 1);
        let at = bid.submitted_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn slots_remaining_saturates() {
        let market = MarketState {
            current_price: dec!(10),
            phase: AuctionPhase::Active,
            time_remaining_ms: 0,
        };
        let state = AuctionState::from_parts(100, 90, market);
        assert_eq!(state.slots_remaining(), 10);
        let state = AuctionState::from_parts(100, 100, market);
        assert_eq!(state.slots_remaining(), 0);
    }

    #[test]
    fn bid_serializes_price_as_string() {
        let bid = Bid::new(BidId::new(), wallet(), dec!(3.5), 42, 7);
        let json = serde_json::to_value(&bid).unwrap();
        assert_eq!(json["price"], "3.50");
        assert_eq!(json["slot"], 7);
        assert_eq!(json["wallet"], "abcd...wxyz");
    }

    #[test]
    fn deserialized_bid_is_rounded_and_clamped() {
        let bid = Bid::new(BidId::new(), wallet(), dec!(4), 42, 7);
        let mut json = serde_json::to_value(&bid).unwrap();

        json["price"] = serde_json::Value::from("4.005");
        let back: Bid = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back.price().to_string(), "4.01");
        assert_eq!(back.id(), bid.id());

        json["price"] = serde_json::Value::from("-3");
        let back: Bid = serde_json::from_value(json).unwrap();
        assert_eq!(back.price().to_string(), "0.00");
    }
}
