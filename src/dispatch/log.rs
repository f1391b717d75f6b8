//! # Simple logging handler for debugging and demos.
//!
//! [`TriggerLog`] builds handlers that print trigger firings to stdout in a
//! human-readable format.
//!
//! ## Output format
//! ```text
//! [moved] channel=0 value=42 last=41 dt_us=10000
//! [limit] channel=0 value=181 last=180 dt_us=10000
//! [paused] channel=0 value=90 last=90 dt_us=10000
//! ```
//!
//! Enabled via the `logging` feature. Primarily useful for development,
//! debugging, and the demos — wire a custom handler for anything structured.

use std::sync::Arc;

use crate::actuator::TickContext;
use crate::dispatch::{Handler, Trigger};

/// Stdout handler factory.
///
/// Not intended for production use; register a custom handler for structured
/// logging or metrics collection.
pub struct TriggerLog;

impl TriggerLog {
    /// Builds a handler that prints every firing of `trigger`.
    pub fn handler(trigger: Trigger) -> Handler<TickContext> {
        Arc::new(move |ctx: &TickContext| {
            println!(
                "[{}] channel={} value={} last={} dt_us={}",
                trigger.as_label(),
                ctx.channel(),
                ctx.value(),
                ctx.last_value(),
                ctx.delta_time().as_micros(),
            );
        })
    }
}
