//! Fixed vocabulary of lifecycle triggers.

/// Classification of points in the per-tick algorithm at which registered
/// handlers are invoked.
///
/// One tick raises a subset of these, in a fixed order (see
/// [`ScheduledActuator`](crate::actuator::ScheduledActuator)):
/// `Delay` alone while inside a programmed delay window; otherwise `Loop`,
/// then `Changed` when the observed value moved, then either `Paused` or
/// `Running` followed by `Limit`/`Moved`. `Init`, `Stop` and `Deinit` fire
/// once at the corresponding lifecycle edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Once, when the actuator's tick callback is realized.
    Init,
    /// Every tick before business logic, unless suppressed by a delay window.
    Loop,
    /// Fires instead of `Loop` and everything downstream while inside a
    /// programmed delay window.
    Delay,
    /// The tick proceeds with active logic.
    Running,
    /// The task is not running, or its backing device is detached.
    Paused,
    /// The observed value differs from the last observed value.
    Changed,
    /// The observed value is outside the configured [min, max].
    Limit,
    /// The observed value is within bounds; normal progression. The engine
    /// classifies only — advancing position is the handler's job.
    Moved,
    /// Once, on `stop`.
    Stop,
    /// Once, on `deinit`.
    Deinit,
}

impl Trigger {
    /// All trigger codes, in per-tick evaluation order.
    pub const ALL: [Trigger; 10] = [
        Trigger::Init,
        Trigger::Loop,
        Trigger::Delay,
        Trigger::Running,
        Trigger::Paused,
        Trigger::Changed,
        Trigger::Limit,
        Trigger::Moved,
        Trigger::Stop,
        Trigger::Deinit,
    ];

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Trigger::Init => "init",
            Trigger::Loop => "loop",
            Trigger::Delay => "delay",
            Trigger::Running => "running",
            Trigger::Paused => "paused",
            Trigger::Changed => "changed",
            Trigger::Limit => "limit",
            Trigger::Moved => "moved",
            Trigger::Stop => "stop",
            Trigger::Deinit => "deinit",
        }
    }
}
