//! Slot clock, Dutch price engine, and auction coordination for the Chronos
//! auction simulation.
//!
//! A running auction is three cooperating tasks: a slot clock counting
//! toward the target slot, a price engine decaying the price and walking
//! the phase from `Active` through `Building` to `Executed`, and a
//! coordinator that owns the bid ledger and the simulated wallet. Consumers
//! talk to it through an [`AuctionHandle`].
//!
//! # Modules
//!
//! - [`clock`] -- Simulated slot counter with clamped random steps.
//! - [`config`] -- Configuration loading from `chronos-config.yaml` into
//!   strongly-typed structs.
//! - [`coordinator`] -- Single owner of the ledger and wallet; serves
//!   commands.
//! - [`display`] -- Formatting for prices, countdowns, and slots.
//! - [`history`] -- Bounded price samples for the chart.
//! - [`pricing`] -- [`DutchSchedule`] and the stateful [`PriceEngine`].
//! - [`runner`] -- Task spawning, [`StopSignal`], and the [`AuctionHandle`].
//! - [`time`] -- Injectable wall-clock sources.
//! - [`wallet`] -- Wallet identity and bid id generation.
//!
//! [`AuctionHandle`]: runner::AuctionHandle
//! [`DutchSchedule`]: pricing::DutchSchedule
//! [`PriceEngine`]: pricing::PriceEngine
//! [`StopSignal`]: runner::StopSignal

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod history;
pub mod pricing;
pub mod runner;
pub mod time;
pub mod wallet;

pub use config::AuctionConfig;
pub use runner::{AuctionHandle, RunnerError, start_auction};
