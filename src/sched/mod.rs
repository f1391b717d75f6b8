//! Scheduler context and timer tasks.
//!
//! - [`Scheduler`] — explicitly constructed context object owning the
//!   injected timer source and clock, with broadcast `stop_all`/`pause_all`
//!   over every live task (there is no hidden global registry);
//! - [`TimerTask`] — one logical timer with run-mode semantics,
//!   pause/stop/reset/deinit and a per-fire timeout budget.

mod scheduler;
mod task;

pub use scheduler::Scheduler;
pub use task::{TaskCallback, TaskConfig, TimerTask};

pub(crate) use task::TaskInner;
