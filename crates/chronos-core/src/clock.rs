//! Simulated slot counter.
//!
//! The slot clock stands in for a chain's slot height. Every tick it moves
//! forward by a small random step until it reaches the target slot, after
//! which it stays put.
//!
//! # Invariants
//!
//! - The counter never decreases.
//! - The published slot ([`SlotClock::current`]) never exceeds the target.
//!   The last random step may carry the raw counter up to two slots past the
//!   target; that overshoot is clamped away before anyone sees it.

use rand::Rng;

/// Smallest random step per tick.
pub const MIN_SLOT_STEP: u64 = 1;

/// Largest random step per tick.
pub const MAX_SLOT_STEP: u64 = 3;

/// Simulated slot counter advancing toward a target slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClock {
    /// Raw counter value.
    slot: u64,

    /// Slot at which the counter stops advancing.
    target: u64,
}

impl SlotClock {
    /// Create a clock at `initial` counting toward `target`.
    ///
    /// An `initial` past the target starts the clock already finished.
    pub const fn new(initial: u64, target: u64) -> Self {
        Self {
            slot: initial,
            target,
        }
    }

    /// Advance by a random step in `MIN_SLOT_STEP..=MAX_SLOT_STEP`.
    ///
    /// Does nothing once the target is reached. Returns the published slot.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) -> u64 {
        if self.is_at_target() {
            return self.current();
        }
        let step = rng.random_range(MIN_SLOT_STEP..=MAX_SLOT_STEP);
        self.advance_by(step)
    }

    /// Advance by an explicit step. Does nothing once the target is reached.
    ///
    /// Returns the published slot.
    pub const fn advance_by(&mut self, step: u64) -> u64 {
        if self.slot < self.target {
            self.slot = self.slot.saturating_add(step);
        }
        self.current()
    }

    /// The published slot, clamped to the target.
    pub const fn current(&self) -> u64 {
        if self.slot < self.target {
            self.slot
        } else {
            self.target
        }
    }

    /// The target slot.
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Whether the counter has reached the target.
    pub const fn is_at_target(&self) -> bool {
        self.slot >= self.target
    }

    /// Slots left until the target.
    pub const fn slots_remaining(&self) -> u64 {
        self.target.saturating_sub(self.slot)
    }
}
