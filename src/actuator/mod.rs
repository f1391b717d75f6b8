//! Scheduled actuation over an injected position capability.
//!
//! - [`PositionDevice`] — the narrow capability interface the core consumes
//!   (GPIO-PWM or I2C PWM-chip backends live outside this crate);
//! - [`MemoryDevice`] — in-memory implementation for tests and demos;
//! - [`ScheduledActuator`] — a task specialization running the fixed
//!   per-tick classification algorithm and raising triggers;
//! - [`Sweep`] — bouncing position generator for `Moved` handlers.

mod device;
mod scheduled;
mod step;

pub use device::{MemoryDevice, PositionDevice};
pub use scheduled::{ScheduledActuator, TickContext, DEFAULT_MAX, DEFAULT_MIN};
pub use step::Sweep;
