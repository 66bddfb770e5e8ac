//! Shared type definitions for the Chronos auction simulation.
//!
//! This crate is the single source of truth for the types published by the
//! simulation core. Types flow downstream to `TypeScript` via `ts-rs` for
//! the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Bid identifiers and wallet identities
//! - [`enums`] -- The auction phase state machine
//! - [`structs`] -- Bids, published auction state, price chart samples

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::AuctionPhase;
pub use ids::{BidId, WalletId};
pub use structs::{AuctionState, Bid, MarketState, PRICE_DECIMALS, PricePoint, round_price};
