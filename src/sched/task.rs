//! # TimerTask: one logical timer with lifecycle semantics.
//!
//! A [`TimerTask`] wraps exactly one timer entry and layers run-mode
//! semantics on top of the raw source:
//!
//! ```text
//! Uninitialized ──init──► Running ──pause──► Paused   (entry stays registered)
//!                            │  ▲              │
//!                            │  └────init──────┘
//!                            └─stop/deinit──► Stopped (entry deregistered)
//! ```
//!
//! ## Rules
//! - `init` validates the rate: a non-positive frequency or zero period is a
//!   configuration error here, even though the source below would tolerate
//!   the resulting dead entry structurally.
//! - Reconfiguration (`set_rate`, `reset`) re-registers under the same timer
//!   id: the old entry is replaced atomically, never duplicated.
//! - The bound callback checks `running` on every fire, so `pause()` leaves
//!   the entry ticking but suppresses user-visible effects;
//!   [`TaskConfig::with_tick_while_paused`] opts out of that check for
//!   callers that classify the paused state themselves (the actuator layer).
//! - A configured timeout budget bounds each fire with
//!   `tokio::time::timeout`; an overrunning fire is abandoned silently and
//!   the next fire proceeds.
//! - `stop` and `deinit` are idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use crate::error::SchedulerError;
use crate::sched::Scheduler;
use crate::source::{BoxTickFuture, Rate, TickFn, TimerId, TimerMode, TimerSource, TimerSpec};

/// User callback bound to a task: produces a fresh future per fire.
pub type TaskCallback = Arc<dyn Fn() -> BoxTickFuture + Send + Sync>;

/// Configuration for one `init`.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tickmux::{Rate, TaskConfig};
///
/// let cfg = TaskConfig::periodic(Rate::Period(Duration::from_millis(20)))
///     .with_timeout(Duration::from_millis(15));
/// assert_eq!(cfg.timeout, Some(Duration::from_millis(15)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Firing mode of the backing entry.
    pub mode: TimerMode,
    /// Firing rate (exactly one of frequency or period, by construction).
    pub rate: Rate,
    /// Per-fire budget; `None` lets a fire run to completion.
    pub timeout: Option<Duration>,
    /// Deliver ticks even while paused (the bound callback then owns the
    /// running classification).
    pub tick_while_paused: bool,
}

impl TaskConfig {
    /// Periodic task at the given rate.
    pub fn periodic(rate: Rate) -> Self {
        Self {
            mode: TimerMode::Periodic,
            rate,
            timeout: None,
            tick_while_paused: false,
        }
    }

    /// One-shot task at the given rate.
    pub fn one_shot(rate: Rate) -> Self {
        Self {
            mode: TimerMode::OneShot,
            rate,
            timeout: None,
            tick_while_paused: false,
        }
    }

    /// Sets the per-fire timeout budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keeps delivering ticks while the task is paused.
    pub fn with_tick_while_paused(mut self) -> Self {
        self.tick_while_paused = true;
        self
    }
}

/// Mutable configuration of a task.
struct TaskState {
    config: Option<TaskConfig>,
    callback: Option<TaskCallback>,
    timer: Option<TimerId>,
}

/// Shared core of a task; the broadcast list in [`Scheduler`] holds these
/// weakly.
pub(crate) struct TaskInner {
    source: Arc<dyn TimerSource>,
    running: AtomicBool,
    state: Mutex<TaskState>,
}

impl TaskInner {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn pause(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let timer = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.timer.take()
        };
        if let Some(id) = timer {
            self.source.deregister(id);
        }
    }
}

/// Handle to one logical timer. Cloning shares the task.
#[derive(Clone)]
pub struct TimerTask {
    inner: Arc<TaskInner>,
}

impl TimerTask {
    /// Creates an uninitialized task adopted by the scheduler's broadcast
    /// list.
    pub fn new(scheduler: &Scheduler) -> Self {
        let inner = Arc::new(TaskInner {
            source: scheduler.source(),
            running: AtomicBool::new(false),
            state: Mutex::new(TaskState {
                config: None,
                callback: None,
                timer: None,
            }),
        });
        scheduler.adopt(Arc::downgrade(&inner));
        Self { inner }
    }

    /// (Re)initializes the task: validates the rate, registers (or replaces
    /// in place) the backing entry, and sets the task running.
    pub fn init(&self, config: TaskConfig, callback: TaskCallback) -> Result<(), SchedulerError> {
        if !config.rate.is_valid() {
            return Err(SchedulerError::InvalidRate {
                detail: format!("{:?}", config.rate),
            });
        }

        let bound = self.bind(&config, &callback);
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        let spec = TimerSpec {
            id: state.timer,
            mode: config.mode,
            rate: config.rate,
            callback: bound,
        };
        let id = self.inner.source.register(spec);
        state.timer = Some(id);
        state.config = Some(config);
        state.callback = Some(callback);
        drop(state);

        self.inner.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Wraps the user callback with the running check and timeout budget.
    ///
    /// Captures the task weakly: the registry entry never keeps a dropped
    /// task alive.
    fn bind(&self, config: &TaskConfig, callback: &TaskCallback) -> TickFn {
        let weak = Arc::downgrade(&self.inner);
        let user = Arc::clone(callback);
        let timeout = config.timeout;
        let tick_while_paused = config.tick_while_paused;

        Arc::new(move || {
            let weak = weak.clone();
            let user = Arc::clone(&user);
            Box::pin(async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if !tick_while_paused && !inner.is_running() {
                    return;
                }
                match timeout {
                    // Overruns are swallowed: a late fire must not take the
                    // scheduler down with it.
                    Some(budget) if budget > Duration::ZERO => {
                        let _ = tokio::time::timeout(budget, user()).await;
                    }
                    _ => user().await,
                }
            })
        })
    }

    /// Reconfigures the rate, re-invoking `init` with the stored mode,
    /// timeout and callback.
    pub fn set_rate(&self, rate: Rate) -> Result<(), SchedulerError> {
        let (mut config, callback) = self.current()?;
        config.rate = rate;
        self.init(config, callback)
    }

    /// Reapplies the current configuration (a paused or stopped task
    /// re-enters `Running`).
    pub fn reset(&self) -> Result<(), SchedulerError> {
        let (config, callback) = self.current()?;
        self.init(config, callback)
    }

    /// Suppresses user-visible effects without deregistering the entry.
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Clears running and deregisters the entry. Idempotent.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Stops the task and clears its configuration. Idempotent; a later
    /// `init` starts fresh.
    pub fn deinit(&self) {
        self.inner.stop();
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.config = None;
        state.callback = None;
    }

    /// True while the task is running (initialized and neither paused nor
    /// stopped).
    pub fn running(&self) -> bool {
        self.inner.is_running()
    }

    /// Configured mode, if initialized.
    pub fn mode(&self) -> Option<TimerMode> {
        self.config_field(|c| c.mode)
    }

    /// Configured rate, if initialized.
    pub fn rate(&self) -> Option<Rate> {
        self.config_field(|c| c.rate)
    }

    /// Configured per-fire timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.config_field(|c| c.timeout).flatten()
    }

    /// Id of the backing entry while one is registered.
    pub fn timer_id(&self) -> Option<TimerId> {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.timer
    }

    /// Busy-polls until the task stops running.
    ///
    /// This is a cooperative poll (`yield_now` between probes), not a parked
    /// wait — a documented limitation carried from the target environment,
    /// not a defect.
    ///
    /// The running flag only clears through `pause`/`stop`/`deinit` (or a
    /// scheduler broadcast). In particular a one-shot task stays running
    /// after its single fire removes the entry, so `waiting()` on one never
    /// returns unless something stops it — call this for periodic tasks, or
    /// have the one-shot callback `stop()` its own task.
    pub async fn waiting(&self) {
        while self.running() {
            tokio::task::yield_now().await;
        }
    }

    pub(crate) fn inner_weak(&self) -> Weak<TaskInner> {
        Arc::downgrade(&self.inner)
    }

    fn current(&self) -> Result<(TaskConfig, TaskCallback), SchedulerError> {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        match (&state.config, &state.callback) {
            (Some(config), Some(callback)) => Ok((*config, Arc::clone(callback))),
            _ => Err(SchedulerError::NotInitialized),
        }
    }

    fn config_field<T>(&self, f: impl FnOnce(&TaskConfig) -> T) -> Option<T> {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.config.as_ref().map(f)
    }
}
