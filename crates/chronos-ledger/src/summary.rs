//! Aggregate figures over the bid ledger.
//!
//! The summary backs the final report shown once the auction executes:
//! how many bids were collected, the total volume they represent, and the
//! price spread. Every figure is recomputed from the entries; nothing is
//! tracked incrementally.

use std::collections::BTreeSet;

use chronos_types::Bid;
use rust_decimal::Decimal;
use serde::Serialize;

/// Aggregate figures over a set of bids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    /// Number of bids.
    pub total_bids: usize,
    /// Sum of all bid prices.
    pub total_volume: Decimal,
    /// Mean bid price at full precision, `None` when there are no bids.
    pub average_price: Option<Decimal>,
    /// Lowest bid price.
    pub lowest_price: Option<Decimal>,
    /// Highest bid price.
    pub highest_price: Option<Decimal>,
    /// Number of distinct wallets that bid.
    pub distinct_wallets: usize,
    /// Slot of the earliest bid.
    pub first_slot: Option<u64>,
    /// Slot of the latest bid.
    pub last_slot: Option<u64>,
}

impl LedgerSummary {
    /// Compute the summary for `bids`, which must be in timestamp order.
    pub fn from_bids(bids: &[Bid]) -> Self {
        let total_volume = bids
            .iter()
            .fold(Decimal::ZERO, |sum, bid| sum.saturating_add(bid.price()));

        let average_price = u64::try_from(bids.len())
            .ok()
            .filter(|count| *count > 0)
            .and_then(|count| total_volume.checked_div(Decimal::from(count)));

        let distinct_wallets = bids
            .iter()
            .map(Bid::wallet)
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total_bids: bids.len(),
            total_volume,
            average_price,
            lowest_price: bids.iter().map(Bid::price).min(),
            highest_price: bids.iter().map(Bid::price).max(),
            distinct_wallets,
            first_slot: bids.first().map(Bid::slot),
            last_slot: bids.last().map(Bid::slot),
        }
    }
}
