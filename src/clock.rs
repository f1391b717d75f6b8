//! # Monotonic clock abstraction with wraparound-safe arithmetic.
//!
//! Every timestamp in the crate is a `u64` microsecond counter that is
//! allowed to wrap. Comparisons therefore never use `<`/`>` directly; they
//! go through [`ticks_diff`], which interprets the wrapping distance between
//! two timestamps as a signed value (the convention of tick counters on
//! microcontroller platforms).
//!
//! Two implementations are provided:
//! - [`MonotonicClock`] — wall-time clock backed by [`tokio::time::Instant`],
//!   so a runtime started with a paused clock advances it deterministically
//!   in tests;
//! - [`ManualClock`] — an atomics-backed clock advanced explicitly by the
//!   owner, intended for externally ticked sources and tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::Instant;

/// Signed difference `later - earlier` between two wrapping tick values.
///
/// The result is positive when `later` is ahead of `earlier`, negative when
/// behind, regardless of counter wraparound — as long as the real distance
/// fits in `i64`.
///
/// # Example
/// ```
/// use tickmux::clock::ticks_diff;
///
/// assert_eq!(ticks_diff(150, 100), 50);
/// assert_eq!(ticks_diff(100, 150), -50);
/// // Wraparound: 10 is "ahead" of a counter that was near the top.
/// assert_eq!(ticks_diff(10, u64::MAX - 9), 20);
/// ```
#[inline]
pub fn ticks_diff(later: u64, earlier: u64) -> i64 {
    later.wrapping_sub(earlier) as i64
}

/// Monotonic microsecond timestamp source.
///
/// Implementations must be cheap to call from a scan pass and safe to share
/// across the context that drives ticks and the contexts that mutate the
/// registry.
pub trait Clock: Send + Sync + 'static {
    /// Current timestamp in microseconds. May wrap.
    fn now_us(&self) -> u64;

    /// Current timestamp in milliseconds. May wrap.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }
}

/// Wall-time clock measuring microseconds since its construction.
///
/// Backed by [`tokio::time::Instant`]: under a normal runtime this is the
/// OS monotonic clock; under `#[tokio::test(start_paused = true)]` it follows
/// the runtime's virtual time, which makes timing tests deterministic.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose zero point is "now".
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        // Saturates far beyond any realistic process lifetime; wrapping
        // arithmetic downstream handles the theoretical rollover.
        self.epoch.elapsed().as_micros() as u64
    }
}

/// Manually advanced clock for externally ticked sources and tests.
///
/// Cloning shares the underlying counter.
///
/// # Example
/// ```
/// use tickmux::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance_ms(5);
/// assert_eq!(clock.now_us(), 5_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at timestamp zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `us` microseconds (wrapping).
    pub fn advance_us(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }

    /// Advances the clock by `ms` milliseconds (wrapping).
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.wrapping_mul(1_000));
    }

    /// Sets the clock to an absolute timestamp.
    pub fn set_us(&self, us: u64) {
        self.now_us.store(us, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_basic() {
        assert_eq!(ticks_diff(1_000, 400), 600);
        assert_eq!(ticks_diff(400, 1_000), -600);
        assert_eq!(ticks_diff(7, 7), 0);
    }

    #[test]
    fn test_diff_across_wraparound() {
        let before = u64::MAX - 99;
        let after = 100u64;
        assert_eq!(ticks_diff(after, before), 200);
        assert_eq!(ticks_diff(before, after), -200);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_us(), 0);
        clock.advance_us(250);
        clock.advance_ms(1);
        assert_eq!(clock.now_us(), 1_250);
        assert_eq!(clock.now_ms(), 1);
    }

    #[test]
    fn test_manual_clock_clone_shares_counter() {
        let clock = ManualClock::new();
        let other = clock.clone();
        other.advance_ms(3);
        assert_eq!(clock.now_us(), 3_000);
    }
}
