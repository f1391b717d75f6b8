//! Trigger vocabulary and per-task event dispatch.
//!
//! - [`Trigger`] — the fixed set of lifecycle trigger codes raised by the
//!   per-tick algorithm;
//! - [`EventDispatcher`] — ordered handler lists per trigger, fired
//!   synchronously inside the tick with per-handler panic isolation.

mod dispatcher;
mod trigger;

#[cfg(feature = "logging")]
mod log;

pub use dispatcher::{EventDispatcher, Handler};
pub use trigger::Trigger;

#[cfg(feature = "logging")]
pub use log::TriggerLog;
