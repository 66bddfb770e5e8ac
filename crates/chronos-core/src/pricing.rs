//! Dutch auction price schedule and the stateful price engine.
//!
//! [`DutchSchedule`] is the pure part: given elapsed milliseconds since the
//! auction started it returns the phase, the linearly decayed price and the
//! time remaining. [`PriceEngine`] wraps a schedule and an absolute start
//! instant and adds the two rules that need memory:
//!
//! - the phase only moves forward, even if the clock moves backwards;
//! - once the decay window closes the price freezes at the last value
//!   computed while the auction was active.
//!
//! The schedule is
//!
//! ```text
//! elapsed <  D          active     price = start - (start - end) * elapsed / D
//! D <= elapsed < D + B  building   price frozen, time remaining 0
//! elapsed >= D + B      executed   terminal
//! ```
//!
//! with `elapsed` clamped to zero when the clock reads before the start.
//! Prices are [`Decimal`] at full precision; rounding to two places happens
//! only at the presentation boundary.

use chronos_types::{AuctionPhase, MarketState};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::PricingConfig;

/// Phase, price, and remaining time at one instant of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    /// Phase at this instant.
    pub phase: AuctionPhase,
    /// Decayed price, `None` outside [`AuctionPhase::Active`].
    pub price: Option<Decimal>,
    /// Milliseconds until the decay window closes (0 outside `Active`).
    pub time_remaining_ms: u64,
}

/// Linear price decay over a fixed window, followed by a batch-build window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutchSchedule {
    start_price: Decimal,
    end_price: Decimal,
    duration_ms: u64,
    build_window_ms: u64,
}

impl DutchSchedule {
    /// Create a schedule. `end_price` is expected not to exceed
    /// `start_price`; [`AuctionConfig::validate`](crate::config::AuctionConfig::validate)
    /// enforces it for configured auctions.
    pub const fn new(
        start_price: Decimal,
        end_price: Decimal,
        duration_ms: u64,
        build_window_ms: u64,
    ) -> Self {
        Self {
            start_price,
            end_price,
            duration_ms,
            build_window_ms,
        }
    }

    /// Build a schedule from the pricing section of the configuration.
    pub const fn from_config(config: &PricingConfig) -> Self {
        Self::new(
            config.start_price,
            config.end_price,
            config.duration_ms,
            config.build_window_ms,
        )
    }

    /// Price at the start of the auction.
    pub const fn start_price(&self) -> Decimal {
        self.start_price
    }

    /// Floor price.
    pub const fn end_price(&self) -> Decimal {
        self.end_price
    }

    /// Length of the decay window.
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Length of the batch-build window.
    pub const fn build_window_ms(&self) -> u64 {
        self.build_window_ms
    }

    /// Elapsed milliseconds at which the auction executes (`D + B`).
    pub const fn execution_at_ms(&self) -> u64 {
        self.duration_ms.saturating_add(self.build_window_ms)
    }

    /// Phase at `elapsed_ms` since the start.
    pub const fn phase_at(&self, elapsed_ms: i64) -> AuctionPhase {
        let elapsed = clamp_elapsed(elapsed_ms);
        if elapsed < self.duration_ms {
            AuctionPhase::Active
        } else if elapsed < self.execution_at_ms() {
            AuctionPhase::Building
        } else {
            AuctionPhase::Executed
        }
    }

    /// Decayed price at `elapsed_ms`, clamped to `[end_price, start_price]`.
    ///
    /// Defined for every elapsed value: negative elapsed gives the start
    /// price, anything at or past the window gives the floor.
    pub fn price_at(&self, elapsed_ms: i64) -> Decimal {
        let progress = self.progress(elapsed_ms);
        let spread = self.start_price.saturating_sub(self.end_price);
        let price = spread
            .checked_mul(progress)
            .and_then(|decayed| self.start_price.checked_sub(decayed))
            .unwrap_or(self.end_price);
        price.max(self.end_price).min(self.start_price)
    }

    /// Fraction of the decay window elapsed, in `[0, 1]`.
    pub fn progress(&self, elapsed_ms: i64) -> Decimal {
        let elapsed = Decimal::from(clamp_elapsed(elapsed_ms));
        elapsed
            .checked_div(Decimal::from(self.duration_ms))
            .unwrap_or(Decimal::ONE)
            .clamp(Decimal::ZERO, Decimal::ONE)
    }

    /// Milliseconds until the decay window closes.
    pub const fn time_remaining_ms(&self, elapsed_ms: i64) -> u64 {
        self.duration_ms.saturating_sub(clamp_elapsed(elapsed_ms))
    }

    /// Evaluate the schedule at `elapsed_ms`.
    pub fn evaluate(&self, elapsed_ms: i64) -> PriceQuote {
        let phase = self.phase_at(elapsed_ms);
        match phase {
            AuctionPhase::Active => PriceQuote {
                phase,
                price: Some(self.price_at(elapsed_ms)),
                time_remaining_ms: self.time_remaining_ms(elapsed_ms),
            },
            AuctionPhase::Building | AuctionPhase::Executed => PriceQuote {
                phase,
                price: None,
                time_remaining_ms: 0,
            },
        }
    }
}

/// Clamp a possibly negative elapsed time to zero.
const fn clamp_elapsed(elapsed_ms: i64) -> u64 {
    if elapsed_ms > 0 {
        elapsed_ms.unsigned_abs()
    } else {
        0
    }
}

/// Stateful price engine sampled on a fixed period.
///
/// Each [`tick`](PriceEngine::tick) re-reads the wall clock and evaluates
/// the schedule afresh; nothing is integrated between ticks. The only state
/// carried over is the current phase (forward-only) and the last active
/// price (frozen outside `Active`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEngine {
    schedule: DutchSchedule,
    start_ms: i64,
    phase: AuctionPhase,
    price: Decimal,
    time_remaining_ms: u64,
}

impl PriceEngine {
    /// Create an engine for an auction that started at `start_ms`.
    ///
    /// Until the first tick the engine reports the start price, the active
    /// phase and the full window remaining.
    pub const fn new(schedule: DutchSchedule, start_ms: i64) -> Self {
        Self {
            schedule,
            start_ms,
            phase: AuctionPhase::Active,
            price: schedule.start_price(),
            time_remaining_ms: schedule.duration_ms(),
        }
    }

    /// The schedule this engine evaluates.
    pub const fn schedule(&self) -> &DutchSchedule {
        &self.schedule
    }

    /// Auction start instant in milliseconds since the Unix epoch.
    pub const fn start_ms(&self) -> i64 {
        self.start_ms
    }

    /// Milliseconds elapsed at `now_ms` (may be negative under clock skew).
    pub const fn elapsed_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.start_ms)
    }

    /// Current phase.
    pub const fn phase(&self) -> AuctionPhase {
        self.phase
    }

    /// Current price at full precision.
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// The state as last computed.
    pub const fn market(&self) -> MarketState {
        MarketState {
            current_price: self.price,
            phase: self.phase,
            time_remaining_ms: self.time_remaining_ms,
        }
    }

    /// Re-evaluate the schedule at `now_ms` and return the new state.
    pub fn tick(&mut self, now_ms: i64) -> MarketState {
        let elapsed_ms = self.elapsed_ms(now_ms);
        let quote = self.schedule.evaluate(elapsed_ms);

        let next_phase = quote.phase.max(self.phase);
        if next_phase != self.phase {
            info!(
                from = %self.phase,
                to = %next_phase,
                elapsed_ms,
                frozen_price = %self.price,
                "Auction phase transition"
            );
            self.phase = next_phase;
        }

        if self.phase == AuctionPhase::Active {
            if let Some(price) = quote.price {
                self.price = price;
            }
            self.time_remaining_ms = quote.time_remaining_ms;
        } else {
            self.time_remaining_ms = 0;
        }

        self.market()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chronos_types::round_price;
    use rust_decimal_macros::dec;

    use super::*;

    const D: i64 = 300_000;
    const B: i64 = 30_000;
    const T0: i64 = 1_700_000_000_000;

    fn schedule() -> DutchSchedule {
        DutchSchedule::new(dec!(10), dec!(2), 300_000, 30_000)
    }

    #[test]
    fn price_at_zero_is_start_price() {
        assert_eq!(schedule().price_at(0), dec!(10));
    }

    #[test]
    fn price_at_half_window() {
        assert_eq!(schedule().price_at(150_000), dec!(6));
        assert_eq!(round_price(schedule().price_at(150_000)).to_string(), "6.00");
    }

    #[test]
    fn price_matches_linear_formula() {
        let s = schedule();
        for elapsed in [1_i64, 999, 12_345, 77_777, 200_000, 299_999] {
            let expected = dec!(10) - dec!(8) * (Decimal::from(elapsed) / Decimal::from(D));
            assert_eq!(s.price_at(elapsed), expected, "elapsed {elapsed}");
        }
    }

    #[test]
    fn price_approaches_floor_before_window_end() {
        let price = schedule().price_at(D - 1);
        assert!(price > dec!(2));
        assert!(price - dec!(2) < dec!(0.0001));
        assert_eq!(round_price(price), dec!(2.00));
    }

    #[test]
    fn price_is_monotonically_non_increasing() {
        let s = schedule();
        let mut previous = s.price_at(0);
        let mut elapsed = 0;
        while elapsed < D {
            let price = s.price_at(elapsed);
            assert!(price <= previous, "price rose at {elapsed}");
            assert!(price >= dec!(2) && price <= dec!(10));
            previous = price;
            elapsed += 997;
        }
    }

    #[test]
    fn negative_elapsed_clamps_to_start() {
        let s = schedule();
        assert_eq!(s.price_at(-5_000), dec!(10));
        assert_eq!(s.phase_at(-5_000), AuctionPhase::Active);
        assert_eq!(s.time_remaining_ms(-5_000), 300_000);
    }

    #[test]
    fn phase_boundaries() {
        let s = schedule();
        assert_eq!(s.phase_at(0), AuctionPhase::Active);
        assert_eq!(s.phase_at(D - 1), AuctionPhase::Active);
        assert_eq!(s.phase_at(D), AuctionPhase::Building);
        assert_eq!(s.phase_at(D + B - 1), AuctionPhase::Building);
        assert_eq!(s.phase_at(D + B), AuctionPhase::Executed);
        assert_eq!(s.phase_at(D + B + 1_000_000), AuctionPhase::Executed);
    }

    #[test]
    fn evaluate_outside_active_has_no_price() {
        let s = schedule();
        let quote = s.evaluate(D);
        assert_eq!(quote.phase, AuctionPhase::Building);
        assert_eq!(quote.price, None);
        assert_eq!(quote.time_remaining_ms, 0);

        let quote = s.evaluate(100_000);
        assert_eq!(quote.price, Some(s.price_at(100_000)));
        assert_eq!(quote.time_remaining_ms, 200_000);
    }

    #[test]
    fn zero_spread_schedule_is_flat() {
        let s = DutchSchedule::new(dec!(3), dec!(3), 1_000, 0);
        assert_eq!(s.price_at(500), dec!(3));
        assert_eq!(s.phase_at(1_000), AuctionPhase::Executed);
    }

    #[test]
    fn engine_starts_active_at_start_price() {
        let engine = PriceEngine::new(schedule(), T0);
        assert_eq!(engine.phase(), AuctionPhase::Active);
        assert_eq!(engine.price(), dec!(10));
        assert_eq!(engine.market().time_remaining_ms, 300_000);
    }

    #[test]
    fn engine_tick_at_half_window() {
        let mut engine = PriceEngine::new(schedule(), T0);
        let market = engine.tick(T0 + 150_000);
        assert_eq!(market.phase, AuctionPhase::Active);
        assert_eq!(market.current_price, dec!(6));
        assert_eq!(market.time_remaining_ms, 150_000);
    }

    #[test]
    fn price_freezes_when_building() {
        let mut engine = PriceEngine::new(schedule(), T0);
        let last_active = engine.tick(T0 + D - 100).current_price;

        let market = engine.tick(T0 + D);
        assert_eq!(market.phase, AuctionPhase::Building);
        assert_eq!(market.current_price, last_active);
        assert_eq!(round_price(market.current_price), dec!(2.00));
        assert_eq!(market.time_remaining_ms, 0);

        let market = engine.tick(T0 + D + 10_000);
        assert_eq!(market.current_price, last_active);
    }

    #[test]
    fn freeze_keeps_last_sampled_value_not_floor() {
        let mut engine = PriceEngine::new(schedule(), T0);
        engine.tick(T0 + 150_000);
        let market = engine.tick(T0 + D);
        assert_eq!(market.phase, AuctionPhase::Building);
        assert_eq!(market.current_price, dec!(6));
    }

    #[test]
    fn late_start_stays_at_start_price() {
        let mut engine = PriceEngine::new(schedule(), T0);
        let market = engine.tick(T0 + D + 1_000);
        assert_eq!(market.phase, AuctionPhase::Building);
        assert_eq!(market.current_price, dec!(10));
    }

    #[test]
    fn executed_is_terminal() {
        let mut engine = PriceEngine::new(schedule(), T0);
        assert_eq!(engine.tick(T0 + D + B).phase, AuctionPhase::Executed);
        assert_eq!(engine.tick(T0 + D + B + 60_000).phase, AuctionPhase::Executed);
    }

    #[test]
    fn phase_never_goes_backward_under_clock_skew() {
        let mut engine = PriceEngine::new(schedule(), T0);
        engine.tick(T0 + D + 5);
        let market = engine.tick(T0 + 1_000);
        assert_eq!(market.phase, AuctionPhase::Building);
        assert_eq!(market.time_remaining_ms, 0);

        engine.tick(T0 + D + B);
        assert_eq!(engine.tick(T0).phase, AuctionPhase::Executed);
    }

    #[test]
    fn clock_before_start_reports_full_window() {
        let mut engine = PriceEngine::new(schedule(), T0);
        let market = engine.tick(T0 - 10_000);
        assert_eq!(market.phase, AuctionPhase::Active);
        assert_eq!(market.current_price, dec!(10));
        assert_eq!(market.time_remaining_ms, 300_000);
    }
}
