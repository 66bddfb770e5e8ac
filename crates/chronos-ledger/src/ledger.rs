//! The bid ledger: an ordered, append-only record of submitted bids.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Ordered**: entries are sorted by timestamp ascending after every
//!   insertion; equal timestamps keep insertion order.
//! - **Unique ids**: a bid whose id is already present is rejected.
//! - **Precision**: prices are [`Decimal`](rust_decimal::Decimal) with two
//!   decimal places.

use std::collections::BTreeSet;
use std::sync::Arc;

use chronos_types::{Bid, BidId, WalletId};
use tracing::trace;

use crate::LedgerError;
use crate::summary::LedgerSummary;

/// One row of the leaderboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardEntry<'a> {
    /// 1-based position in chronological order.
    pub rank: usize,
    /// The bid at this position.
    pub bid: &'a Bid,
    /// Whether the bid belongs to the currently connected wallet.
    pub is_current_wallet: bool,
}

/// Rank `bids` (already in timestamp order) and flag those placed by
/// `current_wallet`.
///
/// Works on any chronological slice, including a published snapshot.
pub fn leaderboard<'a>(
    bids: &'a [Bid],
    current_wallet: Option<&WalletId>,
) -> Vec<LeaderboardEntry<'a>> {
    bids.iter()
        .enumerate()
        .map(|(index, bid)| LeaderboardEntry {
            rank: index.saturating_add(1),
            bid,
            is_current_wallet: current_wallet.is_some_and(|wallet| bid.wallet() == wallet),
        })
        .collect()
}

/// The ledger of all bids submitted during the auction.
#[derive(Debug, Default, Clone)]
pub struct BidLedger {
    /// All entries, sorted by timestamp ascending.
    entries: Vec<Bid>,

    /// Ids already recorded, for duplicate rejection.
    ids: BTreeSet<BidId>,
}

impl BidLedger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: BTreeSet::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a bid and restore timestamp order.
    ///
    /// The bid is placed after every existing entry whose timestamp is less
    /// than or equal to its own, which is the same position a stable sort
    /// of the appended sequence would give it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateBid`] if the id is already present.
    pub fn record(&mut self, bid: Bid) -> Result<&Bid, LedgerError> {
        let id = bid.id();
        if !self.ids.insert(id) {
            return Err(LedgerError::DuplicateBid { id });
        }

        let timestamp = bid.timestamp_ms();
        let position = self
            .entries
            .partition_point(|existing| existing.timestamp_ms() <= timestamp);
        self.entries.insert(position, bid);

        trace!(
            bid_id = %id,
            timestamp_ms = timestamp,
            position,
            len = self.entries.len(),
            "Bid recorded"
        );

        self.entries
            .get(position)
            .ok_or(LedgerError::InternalError("failed to retrieve bid after insert"))
    }

    /// All entries in timestamp order.
    pub fn entries(&self) -> &[Bid] {
        &self.entries
    }

    /// Look up a bid by id.
    pub fn get(&self, id: BidId) -> Option<&Bid> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.entries.iter().find(|bid| bid.id() == id)
    }

    /// All bids submitted by `wallet`, in timestamp order.
    pub fn bids_by_wallet<'a>(&'a self, wallet: &'a WalletId) -> impl Iterator<Item = &'a Bid> {
        self.entries.iter().filter(move |bid| bid.wallet() == wallet)
    }

    /// Ranked view of the ledger, flagging bids by `current_wallet`.
    pub fn leaderboard(&self, current_wallet: Option<&WalletId>) -> Vec<LeaderboardEntry<'_>> {
        leaderboard(&self.entries, current_wallet)
    }

    /// Aggregate figures over every recorded bid.
    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary::from_bids(&self.entries)
    }

    /// Cheap shared copy of the entries for publishing to subscribers.
    pub fn snapshot(&self) -> Arc<[Bid]> {
        Arc::from(self.entries.as_slice())
    }

    /// Whether every adjacent pair of entries is in timestamp order.
    pub fn is_chronological(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| match pair {
                [a, b] => a.timestamp_ms() <= b.timestamp_ms(),
                _ => true,
            })
    }
}
