//! Append-only bid ledger for the Chronos auction simulation.
//!
//! Every bid the coordinator accepts is recorded here. The ledger is the
//! single ordered record of the auction: entries are never modified or
//! removed, and the sequence is sorted by submission timestamp after every
//! insertion.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`BidLedger`] struct: ordered, append-only storage
//!   with leaderboard queries.
//! - [`summary`] -- Aggregate figures for the final report.
//!
//! # Ordering
//!
//! For every pair of adjacent entries `a`, `b`:
//!
//! ```text
//! a.timestamp_ms <= b.timestamp_ms
//! ```
//!
//! Bids with equal timestamps keep their insertion order.
//!
//! # Usage
//!
//! ```
//! use chronos_ledger::BidLedger;
//! use chronos_types::{Bid, BidId, WalletId};
//! use rust_decimal::Decimal;
//!
//! let mut ledger = BidLedger::new();
//! let wallet = WalletId::new("ab12...cd34");
//!
//! ledger.record(Bid::new(BidId::new(), wallet.clone(), Decimal::new(600, 2), 2_000, 10)).ok();
//! ledger.record(Bid::new(BidId::new(), wallet, Decimal::new(700, 2), 1_000, 9)).ok();
//!
//! assert_eq!(ledger.len(), 2);
//! assert_eq!(ledger.entries()[0].timestamp_ms(), 1_000);
//! ```

pub mod ledger;
pub mod summary;

// Re-export primary types at crate root.
pub use ledger::{BidLedger, LeaderboardEntry, leaderboard};
pub use summary::LedgerSummary;

use chronos_types::BidId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording bids.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A bid with this id is already in the ledger.
    #[error("duplicate bid id: {id}")]
    DuplicateBid {
        /// The colliding id.
        id: BidId,
    },

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}
