//! Insertion-ordered registry of timer entries with the shared scan logic.
//!
//! Both source variants delegate here. The registry itself is not
//! synchronized; each variant wraps it in the locking discipline its
//! execution model needs (a mutex for the threaded variant, the single
//! driving context for the ticked one).

use std::sync::Arc;

use crate::clock::ticks_diff;
use crate::source::{TickFn, TimerId, TimerMode, TimerSpec};

/// Bookkeeping record of one logical timer.
pub(crate) struct TimerEntry {
    id: TimerId,
    mode: TimerMode,
    /// Microseconds between fires. Non-positive entries never fire.
    interval_us: i64,
    /// Next due timestamp (wrapping).
    next_fire_us: u64,
    callback: TickFn,
}

/// Registry of timer entries, iterated in insertion order.
pub(crate) struct TimerRegistry {
    entries: Vec<TimerEntry>,
    auto_counter: u64,
}

impl TimerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            auto_counter: 0,
        }
    }

    /// Inserts an entry, assigning the next sequential id when the spec
    /// carries none. An explicit id that is already present replaces that
    /// entry in place, keeping its position in the scan order.
    pub(crate) fn insert(&mut self, spec: TimerSpec, now_us: u64) -> TimerId {
        let id = spec.id.unwrap_or_else(|| {
            self.auto_counter += 1;
            TimerId::from_counter(self.auto_counter)
        });
        let interval_us = spec.rate.interval_us();
        let entry = TimerEntry {
            id,
            mode: spec.mode,
            interval_us,
            // Dead entries get a nominal next-fire; they are skipped anyway.
            next_fire_us: now_us.wrapping_add(interval_us.max(0) as u64),
            callback: spec.callback,
        };
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => self.entries[pos] = entry,
            None => self.entries.push(entry),
        }
        id
    }

    /// Removes an entry; absent ids are a no-op.
    pub(crate) fn remove(&mut self, id: TimerId) {
        self.entries.retain(|e| e.id != id);
    }

    pub(crate) fn contains(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// One scan pass: collects the callbacks of all due entries in insertion
    /// order and reschedules (or removes) them.
    ///
    /// Periodic entries advance by exactly one interval per pass; an entry
    /// that fell several intervals behind catches up across subsequent
    /// passes instead of snapping to `now + interval`, so boundary k stays
    /// at k·interval with no cumulative drift.
    pub(crate) fn collect_due(&mut self, now_us: u64) -> Vec<TickFn> {
        let mut due = Vec::new();
        let mut expired = Vec::new();

        for entry in &mut self.entries {
            if entry.interval_us <= 0 {
                continue;
            }
            if ticks_diff(now_us, entry.next_fire_us) >= 0 {
                due.push(Arc::clone(&entry.callback));
                match entry.mode {
                    TimerMode::Periodic => {
                        entry.next_fire_us =
                            entry.next_fire_us.wrapping_add(entry.interval_us as u64);
                    }
                    TimerMode::OneShot => expired.push(entry.id),
                }
            }
        }
        for id in expired {
            self.remove(id);
        }
        due
    }

    /// Interval of an entry, if registered. Test/inspection helper.
    #[cfg(test)]
    pub(crate) fn interval_us(&self, id: TimerId) -> Option<i64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.interval_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Rate;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn noop() -> TickFn {
        Arc::new(|| Box::pin(async {}))
    }

    fn counting(counter: Arc<AtomicU32>) -> TickFn {
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[test]
    fn test_auto_ids_are_sequential_and_never_reused() {
        let mut reg = TimerRegistry::new();
        let a = reg.insert(TimerSpec::periodic(Rate::Hz(10.0), noop()), 0);
        let b = reg.insert(TimerSpec::periodic(Rate::Hz(10.0), noop()), 0);
        assert_ne!(a, b);

        reg.remove(a);
        reg.remove(b);
        let c = reg.insert(TimerSpec::periodic(Rate::Hz(10.0), noop()), 0);
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn test_explicit_id_replaces_in_place() {
        let mut reg = TimerRegistry::new();
        let id = TimerId::new(7);
        reg.insert(
            TimerSpec::periodic(Rate::Period(Duration::from_millis(10)), noop()).with_id(id),
            0,
        );
        reg.insert(
            TimerSpec::periodic(Rate::Period(Duration::from_millis(25)), noop()).with_id(id),
            0,
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.interval_us(id), Some(25_000));
    }

    #[test]
    fn test_dead_interval_is_kept_but_never_due() {
        let mut reg = TimerRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let id = reg.insert(
            TimerSpec::periodic(Rate::Hz(-1.0), counting(Arc::clone(&counter))),
            0,
        );
        for t in (0..10_000_000).step_by(1_000) {
            assert!(reg.collect_due(t).is_empty());
        }
        assert!(reg.contains(id));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_periodic_advances_by_exactly_one_interval() {
        let mut reg = TimerRegistry::new();
        reg.insert(TimerSpec::periodic(Rate::Period(Duration::from_millis(10)), noop()), 0);

        // Due exactly at 10ms, then 20ms; an early pass collects nothing.
        assert_eq!(reg.collect_due(9_999).len(), 0);
        assert_eq!(reg.collect_due(10_000).len(), 1);
        assert_eq!(reg.collect_due(19_999).len(), 0);
        assert_eq!(reg.collect_due(20_000).len(), 1);
    }

    #[test]
    fn test_overdue_periodic_catches_up_without_drift() {
        let mut reg = TimerRegistry::new();
        reg.insert(TimerSpec::periodic(Rate::Period(Duration::from_millis(10)), noop()), 0);

        // Scans were stalled until t=35ms: one fire per pass until caught up.
        assert_eq!(reg.collect_due(35_000).len(), 1); // boundary 10ms
        assert_eq!(reg.collect_due(35_000).len(), 1); // boundary 20ms
        assert_eq!(reg.collect_due(35_000).len(), 1); // boundary 30ms
        assert_eq!(reg.collect_due(35_000).len(), 0); // next boundary is 40ms
        assert_eq!(reg.collect_due(40_000).len(), 1);
    }

    #[test]
    fn test_one_shot_removed_after_fire() {
        let mut reg = TimerRegistry::new();
        let id = reg.insert(
            TimerSpec::one_shot(Rate::Period(Duration::from_millis(5)), noop()),
            0,
        );
        assert_eq!(reg.collect_due(5_000).len(), 1);
        assert!(!reg.contains(id));
        assert_eq!(reg.collect_due(100_000).len(), 0);
    }

    #[test]
    fn test_simultaneously_due_fire_in_insertion_order() {
        let mut reg = TimerRegistry::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            reg.insert(
                TimerSpec::periodic(
                    Rate::Period(Duration::from_millis(10)),
                    Arc::new(move || {
                        let order = Arc::clone(&order);
                        Box::pin(async move {
                            order.lock().unwrap().push(tag);
                        })
                    }),
                ),
                0,
            );
        }
        let due = reg.collect_due(10_000);
        assert_eq!(due.len(), 3);
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async {
            for cb in due {
                cb().await;
            }
        });
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_wraparound_due_check() {
        let mut reg = TimerRegistry::new();
        let near_wrap = u64::MAX - 2_000;
        reg.insert(
            TimerSpec::periodic(Rate::Period(Duration::from_millis(10)), noop()),
            near_wrap,
        );
        // Next fire wrapped past zero; the entry is not due right before it.
        assert_eq!(reg.collect_due(near_wrap.wrapping_add(9_000)).len(), 0);
        assert_eq!(reg.collect_due(near_wrap.wrapping_add(10_000)).len(), 1);
    }
}
