//! # Timer sources: many logical timers over one tick context.
//!
//! A [`TimerSource`] owns a registry of timer entries and a single execution
//! context that periodically scans the registry and fires due entries. Two
//! interchangeable implementations share the contract, selected once at
//! startup by dependency injection:
//!
//! - [`ThreadedTimerSource`] — one background scan loop (a spawned task),
//!   repeating at a small fixed granularity with a mutex held per pass;
//! - [`TickedTimerSource`] — no background context; the owner drives
//!   [`tick`](TickedTimerSource::tick) from its own recurring context (the
//!   hardware-interrupt model: single, non-reentrant).
//!
//! ## Scan pass
//! ```text
//! for entry in registry (insertion order):
//!     skip if interval <= 0                 (dead entry, tolerated)
//!     if ticks_diff(now, next_fire) >= 0:   (wraparound-safe)
//!         collect callback
//!         Periodic → next_fire += interval  (drift-free, never "now + interval")
//!         OneShot  → remove entry
//! invoke collected callbacks, in order, outside the lock
//! ```
//!
//! ## Rules
//! - Registry membership is the sole authority for future firing: once an id
//!   is absent, no further fires are scheduled for it. A fire already
//!   collected in the current pass still completes; the task layer's running
//!   check suppresses its user-visible effects.
//! - Simultaneously due entries fire in insertion order; there is no
//!   cross-entry priority.
//! - Each callback invocation is panic-isolated: a panicking callback is
//!   reported and the scan continues.

mod registry;
mod threaded;
mod ticked;

pub use threaded::{ThreadedTimerSource, DEFAULT_SCAN_GRANULARITY};
pub use ticked::TickedTimerSource;

pub(crate) use registry::TimerRegistry;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Boxed future produced by one timer fire.
pub type BoxTickFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Timer callback: produces a **fresh** future per fire.
///
/// The closure shape (rather than a stored future) means every fire owns its
/// state; share state explicitly via `Arc` inside the closure if needed.
pub type TickFn = Arc<dyn Fn() -> BoxTickFuture + Send + Sync>;

/// Identifier of a timer entry, unique within one [`TimerSource`].
///
/// Auto-assigned ids come from a monotonic counter and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Creates an explicit id. Registering an entry under an id that is
    /// already present replaces that entry in place.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) fn from_counter(n: u64) -> Self {
        Self(n)
    }
}

/// Firing mode of a timer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Reschedules itself after every fire.
    Periodic,
    /// Removed from the registry immediately after firing once.
    OneShot,
}

/// Firing rate: exactly one of a frequency or a period, by construction.
///
/// The original property pair (mutually exclusive `freq`/`period` fields) is
/// an enum here, so an entry can never carry both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// Fires `f` times per second; interval = 1/f.
    Hz(f64),
    /// Fires once per period.
    Period(Duration),
}

impl Rate {
    /// Resulting interval in microseconds.
    ///
    /// Non-positive and non-finite inputs yield a zero interval. The source
    /// layer *accepts* such entries but never selects them as due; the task
    /// layer rejects them outright (see
    /// [`SchedulerError::InvalidRate`](crate::SchedulerError::InvalidRate)).
    /// A positive frequency above 1 MHz floors at the 1 µs resolution
    /// instead of truncating to a dead interval.
    pub fn interval_us(&self) -> i64 {
        match self {
            Rate::Hz(f) => {
                if !f.is_finite() || *f <= 0.0 {
                    0
                } else {
                    ((1_000_000.0 / f) as i64).max(1)
                }
            }
            Rate::Period(d) => d.as_micros().min(i64::MAX as u128) as i64,
        }
    }

    /// True when the rate produces a positive interval.
    pub fn is_valid(&self) -> bool {
        self.interval_us() > 0
    }
}

/// Registration request for one timer entry.
pub struct TimerSpec {
    /// Explicit id, or `None` for the next sequential id.
    pub id: Option<TimerId>,
    /// Firing mode.
    pub mode: TimerMode,
    /// Firing rate.
    pub rate: Rate,
    /// Callback invoked on each fire.
    pub callback: TickFn,
}

impl TimerSpec {
    /// Periodic entry with an auto-assigned id.
    pub fn periodic(rate: Rate, callback: TickFn) -> Self {
        Self {
            id: None,
            mode: TimerMode::Periodic,
            rate,
            callback,
        }
    }

    /// One-shot entry with an auto-assigned id.
    pub fn one_shot(rate: Rate, callback: TickFn) -> Self {
        Self {
            id: None,
            mode: TimerMode::OneShot,
            rate,
            callback,
        }
    }

    /// Pins the entry to an explicit id (replaces any entry already
    /// registered under it).
    pub fn with_id(mut self, id: TimerId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Shared contract of the two timer-source variants.
///
/// Registration and removal are safe from any context; which context *fires*
/// entries is the variant's concern.
pub trait TimerSource: Send + Sync + 'static {
    /// Registers an entry and returns its id.
    ///
    /// With no explicit id, the next sequential id is assigned. A
    /// non-positive interval is accepted into the registry but skipped on
    /// every scan (callers pass transient invalid values during
    /// reconfiguration; rejecting here would turn that into a fault).
    fn register(&self, spec: TimerSpec) -> TimerId;

    /// Removes an entry. Removing an absent id is a no-op.
    fn deregister(&self, id: TimerId);

    /// True while the entry is registered (and thus can still fire).
    fn contains(&self, id: TimerId) -> bool;

    /// Number of registered entries (dead entries included).
    fn len(&self) -> usize;

    /// True when no entries are registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_hz_to_interval() {
        assert_eq!(Rate::Hz(100.0).interval_us(), 10_000);
        assert_eq!(Rate::Hz(1.0).interval_us(), 1_000_000);
    }

    #[test]
    fn test_rate_period_to_interval() {
        assert_eq!(Rate::Period(Duration::from_millis(250)).interval_us(), 250_000);
        assert_eq!(Rate::Period(Duration::ZERO).interval_us(), 0);
    }

    #[test]
    fn test_nonpositive_rates_are_invalid_but_representable() {
        assert!(!Rate::Hz(0.0).is_valid());
        assert!(!Rate::Hz(-5.0).is_valid());
        assert!(!Rate::Hz(f64::NAN).is_valid());
        assert!(!Rate::Period(Duration::ZERO).is_valid());
        assert!(Rate::Hz(50.0).is_valid());
    }

    #[test]
    fn test_hz_above_one_megahertz_floors_at_one_microsecond() {
        assert_eq!(Rate::Hz(2_000_000.0).interval_us(), 1);
        assert!(Rate::Hz(2_000_000.0).is_valid());
        assert_eq!(Rate::Hz(1_000_000.0).interval_us(), 1);
    }
}
