//! Bounded price history for the price chart.
//!
//! The price task offers every tick to [`PriceHistory::observe`]; a sample
//! is kept at most once per sample interval and only while the decay window
//! is open. When the buffer is full the oldest sample is dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use chronos_types::{AuctionPhase, PricePoint, round_price};

use crate::config::HistoryConfig;
use crate::pricing::DutchSchedule;

/// Rolling window of price samples.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    capacity: usize,
    sample_interval_ms: u64,
    samples: VecDeque<PricePoint>,
    next_sample_ms: Option<i64>,
}

impl PriceHistory {
    /// Create an empty history keeping at most `capacity` samples.
    pub fn new(capacity: usize, sample_interval_ms: u64) -> Self {
        Self {
            capacity,
            sample_interval_ms,
            samples: VecDeque::with_capacity(capacity),
            next_sample_ms: None,
        }
    }

    /// Create an empty history from configuration.
    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.capacity, config.sample_interval_ms)
    }

    /// Offer the instant `now_ms` for sampling.
    ///
    /// Returns the new sample when one was taken. Nothing is taken before
    /// the next sample is due, or once the decay window has closed.
    pub fn observe(
        &mut self,
        schedule: &DutchSchedule,
        start_ms: i64,
        now_ms: i64,
    ) -> Option<PricePoint> {
        if self.capacity == 0 {
            return None;
        }
        if self.next_sample_ms.is_some_and(|due| now_ms < due) {
            return None;
        }

        let elapsed_ms = now_ms.saturating_sub(start_ms);
        if schedule.phase_at(elapsed_ms) != AuctionPhase::Active {
            return None;
        }

        let point = PricePoint {
            elapsed_secs: u64::try_from(elapsed_ms.max(0) / 1_000).unwrap_or(0),
            price: round_price(schedule.price_at(elapsed_ms)),
            timestamp_ms: now_ms,
        };

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(point);

        let interval = i64::try_from(self.sample_interval_ms).unwrap_or(i64::MAX);
        self.next_sample_ms = Some(now_ms.saturating_add(interval));

        Some(point)
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been taken yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&PricePoint> {
        self.samples.back()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.samples.iter()
    }

    /// Shared copy of the samples for publishing.
    pub fn snapshot(&self) -> Arc<[PricePoint]> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn schedule() -> DutchSchedule {
        DutchSchedule::new(dec!(10), dec!(2), 300_000, 30_000)
    }

    #[test]
    fn samples_once_per_interval() {
        let s = schedule();
        let mut history = PriceHistory::new(60, 1_000);

        assert!(history.observe(&s, T0, T0).is_some());
        assert!(history.observe(&s, T0, T0 + 100).is_none());
        assert!(history.observe(&s, T0, T0 + 999).is_none());
        let point = history.observe(&s, T0, T0 + 1_000).unwrap();
        assert_eq!(point.elapsed_secs, 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn sample_carries_rounded_price() {
        let s = schedule();
        let mut history = PriceHistory::new(60, 1_000);
        let point = history.observe(&s, T0, T0 + 150_000).unwrap();
        assert_eq!(point.elapsed_secs, 150);
        assert_eq!(point.price.to_string(), "6.00");
        assert_eq!(point.timestamp_ms, T0 + 150_000);
    }

    #[test]
    fn drops_oldest_when_full() {
        let s = schedule();
        let mut history = PriceHistory::new(3, 1_000);
        for second in 0..5 {
            history.observe(&s, T0, T0 + second * 1_000);
        }
        assert_eq!(history.len(), 3);
        let secs: Vec<u64> = history.iter().map(|p| p.elapsed_secs).collect();
        assert_eq!(secs, vec![2, 3, 4]);
        assert_eq!(history.latest().map(|p| p.elapsed_secs), Some(4));
    }

    #[test]
    fn stops_sampling_after_decay_window() {
        let s = schedule();
        let mut history = PriceHistory::new(60, 1_000);
        assert!(history.observe(&s, T0, T0 + 299_500).is_some());
        assert!(history.observe(&s, T0, T0 + 300_500).is_none());
        assert!(history.observe(&s, T0, T0 + 400_000).is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn clock_before_start_samples_at_zero() {
        let s = schedule();
        let mut history = PriceHistory::new(60, 1_000);
        let point = history.observe(&s, T0, T0 - 5_000).unwrap();
        assert_eq!(point.elapsed_secs, 0);
        assert_eq!(point.price, dec!(10.00));
    }

    #[test]
    fn snapshot_is_oldest_first() {
        let s = schedule();
        let mut history = PriceHistory::new(10, 1_000);
        history.observe(&s, T0, T0);
        history.observe(&s, T0, T0 + 1_000);
        let snap = history.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.first().unwrap().price >= snap.get(1).unwrap().price);
    }
}
