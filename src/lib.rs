//! # tickmux
//!
//! **tickmux** multiplexes many independent logical timers over one tick
//! source, for platforms that expose only one (or a few) genuine hardware
//! timers. On every tick it fans a fixed vocabulary of lifecycle triggers
//! out to registered handlers.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌────────────────────┐
//!     │  TimerTask   │   │  TimerTask   │   │ ScheduledActuator  │
//!     │ (periodic)   │   │ (one-shot)   │   │ (task + triggers)  │
//!     └──────┬───────┘   └──────┬───────┘   └─────────┬──────────┘
//!            ▼                  ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Scheduler (application-owned context)                        │
//! │  - Arc<dyn TimerSource>  (injected once at startup)           │
//! │  - Arc<dyn Clock>                                             │
//! │  - broadcast stop_all / pause_all over live tasks             │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                ▼
//!              ┌─────────────────────────────────────┐
//!              │ TimerSource (one of two variants)   │
//!              │  ThreadedTimerSource: background    │
//!              │    scan loop at a fixed granularity │
//!              │  TickedTimerSource: owner-driven    │
//!              │    tick() (hardware-interrupt model)│
//!              └─────────────────┬───────────────────┘
//!                                ▼
//!          scan registry → fire due entries (insertion order)
//!                                ▼
//!          task callback → per-tick algorithm → EventDispatcher
//!                                ▼
//!          handlers: Init/Loop/Delay/Running/Paused/Changed/
//!                    Limit/Moved/Stop/Deinit
//! ```
//!
//! ## Guarantees and limits
//! - Best-effort periodic firing bounded by the scan granularity — suited to
//!   motion-control cadences (millisecond range), not hard real-time loops.
//! - Drift-free boundaries: a periodic entry's next fire advances by exactly
//!   one interval per fire, so boundary k stays at k·interval.
//! - Registry membership is the sole authority for future firing.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tickmux::{
//!     clock::MonotonicClock, MemoryDevice, Rate, ScheduledActuator, Scheduler,
//!     ThreadedTimerSource, TimerMode, Trigger,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let clock = Arc::new(MonotonicClock::new());
//!     let source = ThreadedTimerSource::new(clock.clone());
//!     let sched = Scheduler::new(source, clock);
//!
//!     let device = Arc::new(MemoryDevice::new(1));
//!     let servo = ScheduledActuator::new(&sched, 0, device)?;
//!
//!     // The engine classifies; a Moved handler advances the position.
//!     servo.irq(
//!         Arc::new(|ctx| {
//!             let _ = ctx.write(ctx.value() + ctx.step());
//!         }),
//!         Trigger::Moved,
//!         1,
//!     );
//!
//!     servo.start(TimerMode::Periodic, Rate::Period(Duration::from_millis(20)))?;
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     servo.stop();
//!     Ok(())
//! }
//! ```

pub mod actuator;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod sched;
pub mod source;

// ---- Public re-exports ----

pub use actuator::{MemoryDevice, PositionDevice, ScheduledActuator, Sweep, TickContext};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use dispatch::{EventDispatcher, Handler, Trigger};
pub use error::{DeviceError, SchedulerError};
pub use sched::{Scheduler, TaskCallback, TaskConfig, TimerTask};
pub use source::{
    Rate, ThreadedTimerSource, TickFn, TickedTimerSource, TimerId, TimerMode, TimerSource,
    TimerSpec,
};

// Optional: stdout trigger logging for demos/debugging.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use dispatch::TriggerLog;
