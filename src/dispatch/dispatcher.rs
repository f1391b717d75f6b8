//! # EventDispatcher: ordered, isolated handler fan-out per trigger.
//!
//! Each task owns one dispatcher mapping trigger codes to ordered handler
//! lists. Handlers are invoked synchronously, in list order, inside whichever
//! context fired the tick — they must be short and non-blocking.
//!
//! ## Registration order
//! ```text
//! irq(h, t, priority):
//!     priority < 1  → push_front   (a later front-insertion outranks earlier ones)
//!     priority >= 1 → push_back    (registration order preserved)
//! ```
//!
//! ## Isolation
//! Each handler invocation is wrapped in `catch_unwind`: one panicking
//! handler cannot prevent later handlers for the same trigger, or later
//! ticks, from running. A dead scheduler is worse than a skipped handler.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use crate::dispatch::Trigger;

/// Handler registered for a trigger. Receives a borrowed tick context.
pub type Handler<C> = Arc<dyn Fn(&C) + Send + Sync>;

/// Per-task mapping from trigger codes to ordered handler lists.
pub struct EventDispatcher<C> {
    handlers: Mutex<HashMap<Trigger, Vec<Handler<C>>>>,
}

impl<C> EventDispatcher<C> {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `handler` for `trigger`.
    ///
    /// `priority < 1` inserts at the front of the trigger's list; `>= 1`
    /// appends.
    pub fn irq(&self, handler: Handler<C>, trigger: Trigger, priority: i32) {
        let mut map = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let list = map.entry(trigger).or_default();
        if priority < 1 {
            list.insert(0, handler);
        } else {
            list.push(handler);
        }
    }

    /// Invokes all handlers registered for `trigger`, in list order.
    ///
    /// The list is snapshotted before invocation, so a handler may register
    /// further handlers without corrupting iteration; additions are seen
    /// from the next fire.
    pub fn fire(&self, trigger: Trigger, ctx: &C) {
        let snapshot = {
            let map = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
            map.get(&trigger).cloned()
        };
        let Some(list) = snapshot else { return };
        for handler in list {
            if std::panic::catch_unwind(AssertUnwindSafe(|| handler(ctx))).is_err() {
                eprintln!(
                    "[tickmux] handler for trigger '{}' panicked; continuing",
                    trigger.as_label()
                );
            }
        }
    }

    /// Number of handlers registered for `trigger`.
    pub fn handler_count(&self, trigger: Trigger) -> usize {
        let map = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(&trigger).map_or(0, Vec::len)
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<C> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn recorder(log: &Arc<StdMutex<Vec<&'static str>>>, tag: &'static str) -> Handler<u32> {
        let log = Arc::clone(log);
        Arc::new(move |_| log.lock().unwrap().push(tag))
    }

    #[test]
    fn test_append_preserves_registration_order() {
        let d = EventDispatcher::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        d.irq(recorder(&log, "a"), Trigger::Loop, 1);
        d.irq(recorder(&log, "b"), Trigger::Loop, 2);
        d.irq(recorder(&log, "c"), Trigger::Loop, 1);
        d.fire(Trigger::Loop, &0);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_front_insertion_outranks_earlier_front_insertions() {
        let d = EventDispatcher::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        d.irq(recorder(&log, "appended"), Trigger::Moved, 1);
        d.irq(recorder(&log, "front-1"), Trigger::Moved, 0);
        d.irq(recorder(&log, "front-2"), Trigger::Moved, -5);
        d.fire(Trigger::Moved, &0);
        assert_eq!(*log.lock().unwrap(), vec!["front-2", "front-1", "appended"]);
    }

    #[test]
    fn test_fire_only_invokes_matching_trigger() {
        let d = EventDispatcher::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        d.irq(recorder(&log, "moved"), Trigger::Moved, 1);
        d.irq(recorder(&log, "limit"), Trigger::Limit, 1);
        d.fire(Trigger::Limit, &0);
        assert_eq!(*log.lock().unwrap(), vec!["limit"]);
    }

    #[test]
    fn test_panicking_handler_does_not_block_later_handlers() {
        let d: EventDispatcher<u32> = EventDispatcher::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        d.irq(Arc::new(|_| panic!("boom")), Trigger::Loop, 1);
        d.irq(recorder(&log, "survivor"), Trigger::Loop, 1);
        d.fire(Trigger::Loop, &0);
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn test_clear_removes_all_registrations() {
        let d: EventDispatcher<u32> = EventDispatcher::new();
        d.irq(Arc::new(|_| {}), Trigger::Loop, 1);
        d.irq(Arc::new(|_| {}), Trigger::Moved, 0);
        assert_eq!(d.handler_count(Trigger::Loop), 1);
        d.clear();
        assert_eq!(d.handler_count(Trigger::Loop), 0);
        assert_eq!(d.handler_count(Trigger::Moved), 0);
    }
}
