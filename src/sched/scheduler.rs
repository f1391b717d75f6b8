//! # Scheduler: the application-owned context for tasks.
//!
//! [`Scheduler`] replaces process-wide singletons (a global task list, a
//! global timer map) with an explicitly constructed object: the application
//! builds a clock and a timer-source variant once at startup, injects them
//! here, and passes the scheduler by reference to every task and actuator
//! constructor.
//!
//! ```text
//! app startup:
//!     clock  = MonotonicClock / ManualClock
//!     source = ThreadedTimerSource / TickedTimerSource   (selected once)
//!     sched  = Scheduler::new(source, clock)
//!
//! per task:
//!     TimerTask::new(&sched)          → adopted into the broadcast list
//!     ScheduledActuator::new(&sched, …)
//!
//! broadcast:
//!     sched.pause_all()  → running = false on every live task
//!     sched.stop_all()   → running = false + entry deregistered
//! ```
//!
//! The scheduler holds tasks weakly: a task dropped by the application
//! disappears from the broadcast list on the next sweep.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::clock::Clock;
use crate::sched::TaskInner;
use crate::source::TimerSource;

/// Application-owned scheduling context.
pub struct Scheduler {
    source: Arc<dyn TimerSource>,
    clock: Arc<dyn Clock>,
    tasks: Mutex<Vec<Weak<TaskInner>>>,
}

impl Scheduler {
    /// Creates a context over the injected source and clock.
    pub fn new(source: Arc<dyn TimerSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The timer source every task of this context registers into.
    pub fn source(&self) -> Arc<dyn TimerSource> {
        Arc::clone(&self.source)
    }

    /// The clock shared by this context.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Pauses every live task: ticks keep occurring, user-visible effects
    /// are suppressed by each task's running check.
    pub fn pause_all(&self) {
        for task in self.live_tasks() {
            task.pause();
        }
    }

    /// Stops every live task: running cleared and timer entries
    /// deregistered. Idempotent per task.
    pub fn stop_all(&self) {
        for task in self.live_tasks() {
            task.stop();
        }
    }

    /// Number of tasks currently alive in this context.
    pub fn task_count(&self) -> usize {
        self.live_tasks().len()
    }

    /// Adds a task to the broadcast list.
    pub(crate) fn adopt(&self, task: Weak<TaskInner>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| t.strong_count() > 0);
        tasks.push(task);
    }

    /// Upgrades the weak list, pruning dropped tasks along the way.
    fn live_tasks(&self) -> Vec<Arc<TaskInner>> {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| t.strong_count() > 0);
        tasks.iter().filter_map(Weak::upgrade).collect()
    }
}
