//! # Tick-driven timer source: scan on an externally supplied cadence.
//!
//! [`TickedTimerSource`] has no background context. The owner drives
//! [`tick`](TickedTimerSource::tick) from one recurring context of its own —
//! the model of a single hardware timer interrupt at a fixed base frequency.
//! Because that context never overlaps itself, a pass runs uncontended; the
//! internal mutex exists only so the type can sit behind the shared
//! [`TimerSource`] trait object.
//!
//! Pair it with a [`ManualClock`](crate::clock::ManualClock) to drive timing
//! deterministically:
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use tickmux::clock::ManualClock;
//! use tickmux::source::{Rate, TickedTimerSource, TimerSource, TimerSpec};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let clock = ManualClock::new();
//! let source = TickedTimerSource::new(Arc::new(clock.clone()));
//!
//! let fired = Arc::new(AtomicU32::new(0));
//! let f = Arc::clone(&fired);
//! source.register(TimerSpec::periodic(
//!     Rate::Period(Duration::from_millis(10)),
//!     Arc::new(move || {
//!         let f = Arc::clone(&f);
//!         Box::pin(async move { f.fetch_add(1, Ordering::SeqCst); })
//!     }),
//! ));
//!
//! clock.advance_ms(10);
//! source.tick().await;
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! # });
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;

use crate::clock::Clock;
use crate::source::{TimerId, TimerRegistry, TimerSource, TimerSpec};

/// Timer source whose scan passes are driven by the owner.
pub struct TickedTimerSource {
    registry: Mutex<TimerRegistry>,
    clock: Arc<dyn Clock>,
}

impl TickedTimerSource {
    /// Creates a source over the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(TimerRegistry::new()),
            clock,
        })
    }

    /// The clock this source reads.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Runs one scan pass: fires every due entry, in insertion order.
    ///
    /// Callbacks run after the registry lock is released, so they may
    /// register or deregister entries; mutations take effect from the next
    /// pass. A panicking callback is reported and the pass continues.
    pub async fn tick(&self) {
        let due = {
            let mut reg = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            reg.collect_due(self.clock.now_us())
        };
        for cb in due {
            let fut = cb();
            if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                eprintln!("[tickmux] timer callback panicked; tick continues");
            }
        }
    }
}

impl TimerSource for TickedTimerSource {
    fn register(&self, spec: TimerSpec) -> TimerId {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec, self.clock.now_us())
    }

    fn deregister(&self, id: TimerId) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    fn contains(&self, id: TimerId) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
