//! Injectable wall-clock sources.
//!
//! Everything in the core that needs "now" asks a [`TimeSource`] instead of
//! reading the system clock directly, so tests can place the auction at any
//! elapsed time without waiting for it.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// A source of wall-clock time in milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync + core::fmt::Debug {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one clone
/// and hand another to the auction.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Arc<AtomicI64>,
}

impl ManualTimeSource {
    /// Create a clock reading `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    /// Jump to `now_ms`. Moving backwards is allowed (it simulates skew).
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::Release);
    }

    /// Move forward by `delta_ms`, saturating at `i64::MAX`.
    pub fn advance(&self, delta_ms: u64) {
        let delta = i64::try_from(delta_ms).unwrap_or(i64::MAX);
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(delta))
            });
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }
}

/// Wall-clock time derived from Tokio's monotonic clock.
///
/// Reads `base_ms` plus the time elapsed on [`tokio::time::Instant`] since
/// construction. Immune to wall-clock jumps, and under a paused Tokio
/// runtime it advances exactly with `tokio::time::advance`.
#[derive(Debug, Clone, Copy)]
pub struct TokioTimeSource {
    base_ms: i64,
    origin: tokio::time::Instant,
}

impl TokioTimeSource {
    /// Anchor the clock so that it reads `base_ms` now.
    pub fn new(base_ms: i64) -> Self {
        Self {
            base_ms,
            origin: tokio::time::Instant::now(),
        }
    }

    /// Anchor the clock at the current system time.
    pub fn from_system() -> Self {
        Self::new(SystemTimeSource.now_ms())
    }
}

impl TimeSource for TokioTimeSource {
    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.base_ms.saturating_add(elapsed)
    }
}
