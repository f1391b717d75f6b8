//! # Thread-driven timer source: one background scan loop for all entries.
//!
//! [`ThreadedTimerSource`] lazily spawns a single scan loop on the first
//! registration; every entry on the source shares that loop. The loop sleeps
//! a fixed granularity between passes and takes the registry mutex for the
//! duration of one pass or one mutation, then releases it — the granularity
//! is the dominant source of jitter and the floor on timer resolution.
//!
//! ## Tick flow
//! ```text
//! loop {
//!     select! {
//!         cancelled  → break                      (source dropped)
//!         sleep(granularity) → {}
//!     }
//!     due = lock(registry).collect_due(now)       (mutex held for one pass)
//!     for cb in due { cb().catch_unwind().await } (outside the lock)
//! }
//! ```
//!
//! Callbacks are invoked after the lock is released, so a handler may
//! register or deregister entries (including its own) without corrupting the
//! scan; such mutations take effect from the next pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::source::{TimerId, TimerRegistry, TimerSource, TimerSpec};

/// Default sleep between scan passes. Bounds worst-case firing latency.
pub const DEFAULT_SCAN_GRANULARITY: Duration = Duration::from_millis(1);

/// Timer source driven by one shared background scan loop.
///
/// The loop is spawned onto the current tokio runtime on first use, so
/// [`register`](TimerSource::register) must be called from within a runtime.
/// Dropping the last handle cancels the loop.
pub struct ThreadedTimerSource {
    registry: Arc<Mutex<TimerRegistry>>,
    clock: Arc<dyn Clock>,
    granularity: Duration,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl ThreadedTimerSource {
    /// Creates a source with [`DEFAULT_SCAN_GRANULARITY`].
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        Self::with_granularity(clock, DEFAULT_SCAN_GRANULARITY)
    }

    /// Creates a source with an explicit scan granularity.
    pub fn with_granularity(clock: Arc<dyn Clock>, granularity: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry: Arc::new(Mutex::new(TimerRegistry::new())),
            clock,
            granularity: granularity.max(Duration::from_micros(1)),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
        })
    }

    /// Spawns the scan loop exactly once, on first registration.
    fn ensure_scan_loop(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let registry = Arc::clone(&self.registry);
        let clock = Arc::clone(&self.clock);
        let granularity = self.granularity;
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(granularity) => {}
                }
                let due = {
                    let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
                    reg.collect_due(clock.now_us())
                };
                for cb in due {
                    let fut = cb();
                    if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                        eprintln!("[tickmux] timer callback panicked; scan continues");
                    }
                }
            }
        });
    }
}

impl TimerSource for ThreadedTimerSource {
    fn register(&self, spec: TimerSpec) -> TimerId {
        let id = {
            let mut reg = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            reg.insert(spec, self.clock.now_us())
        };
        self.ensure_scan_loop();
        id
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

impl Drop for ThreadedTimerSource {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
