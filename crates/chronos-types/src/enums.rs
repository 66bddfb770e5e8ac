//! Enumeration types for the auction simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle phase of the auction.
///
/// Phases only ever move forward: `Active` -> `Building` -> `Executed`.
/// The derived ordering follows that sequence, so "has the auction reached
/// at least phase X" is a plain comparison.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AuctionPhase {
    /// Price is decaying and bids are accepted.
    #[default]
    Active,
    /// Price is frozen while the batch is assembled; bids are still accepted.
    Building,
    /// Terminal. The auction is closed.
    Executed,
}

impl AuctionPhase {
    /// Whether a bid submitted in this phase is recorded.
    pub const fn accepts_bids(self) -> bool {
        matches!(self, Self::Active | Self::Building)
    }

    /// Whether this is the terminal phase.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Executed)
    }

    /// Lowercase name, as serialized.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Building => "building",
            Self::Executed => "executed",
        }
    }
}

impl core::fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
