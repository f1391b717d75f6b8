//! # ScheduledActuator: classify-and-dispatch ticks over a position device.
//!
//! A [`ScheduledActuator`] binds one channel of a [`PositionDevice`] to a
//! [`TimerTask`] and runs a fixed classification algorithm on every tick,
//! raising [`Trigger`]s through its [`EventDispatcher`]:
//!
//! ```text
//! tick:
//!   1. elapsed(delay window start) >= delay budget → reset window start
//!   2. still inside the window     → fire Delay, done (skip 3–6)
//!   3. budget := 0, fire Loop
//!   4. value := device.read(channel); changed → cache, fire Changed
//!   5. !running or detached        → fire Paused, done
//!   6. fire Running; outside [min,max] → Limit, else Moved
//!   7. always: delta_time := elapsed since previous tick
//! ```
//!
//! The engine classifies; handlers act. In particular `Moved` does **not**
//! advance the position — bind a handler (see
//! [`Sweep`](crate::actuator::Sweep)) that writes through the
//! [`TickContext`].
//!
//! Ticks are delivered even while paused (the task is initialized with
//! tick-while-paused delivery), so step 5 can fire `Paused` instead of the
//! callback being suppressed wholesale.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use crate::clock::{ticks_diff, Clock};
use crate::dispatch::{EventDispatcher, Handler, Trigger};
use crate::error::{DeviceError, SchedulerError};
use crate::sched::{Scheduler, TaskConfig, TaskInner, TimerTask};
use crate::source::{Rate, TimerMode};

use super::PositionDevice;

/// Default lower position bound (degrees).
pub const DEFAULT_MIN: f64 = 0.0;
/// Default upper position bound (degrees).
pub const DEFAULT_MAX: f64 = 180.0;

/// Per-tick mutable state.
struct RunState {
    last_value: f64,
    delay_budget_us: i64,
    delay_start_us: u64,
    prev_tick_us: u64,
    delta_time_us: i64,
    min: f64,
    max: f64,
    step: f64,
}

/// State shared between the actuator handle and its tick callback.
struct ActuatorShared {
    channel: usize,
    clock: Arc<dyn Clock>,
    device: Mutex<Option<Arc<dyn PositionDevice>>>,
    run: Arc<Mutex<RunState>>,
    dispatcher: EventDispatcher<TickContext>,
}

/// Snapshot handed to trigger handlers, with write access to the device and
/// the delay window.
///
/// Built fresh for every tick; handlers receive it by reference and must not
/// block on it.
pub struct TickContext {
    channel: usize,
    value: f64,
    last_value: f64,
    delta_time_us: i64,
    running: bool,
    min: f64,
    max: f64,
    step: f64,
    device: Option<Arc<dyn PositionDevice>>,
    run: Arc<Mutex<RunState>>,
}

impl TickContext {
    /// Channel index the actuator is bound to.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Value observed on this tick.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value cached before this tick (differs from [`value`](Self::value)
    /// exactly when `Changed` fired).
    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Elapsed time since the previous tick.
    pub fn delta_time(&self) -> Duration {
        Duration::from_micros(self.delta_time_us.max(0) as u64)
    }

    /// Running classification this tick was evaluated under.
    pub fn running(&self) -> bool {
        self.running
    }

    /// Lower position bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper position bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Advisory stride for `Moved` handlers.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Reads the bound channel directly from the device.
    pub fn read(&self) -> Result<f64, DeviceError> {
        match &self.device {
            Some(dev) => dev.read(self.channel),
            None => Err(DeviceError::Detached),
        }
    }

    /// Writes the bound channel directly to the device.
    pub fn write(&self, value: f64) -> Result<(), DeviceError> {
        match &self.device {
            Some(dev) => dev.write(self.channel, value),
            None => Err(DeviceError::Detached),
        }
    }

    /// Programs a delay window starting at the current window anchor: until
    /// it elapses, ticks fire only `Delay`.
    pub fn request_delay(&self, delay: Duration) {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        run.delay_budget_us = delay.as_micros().min(i64::MAX as u128) as i64;
    }
}

/// Task specialization driving one channel of a position device.
pub struct ScheduledActuator {
    shared: Arc<ActuatorShared>,
    task: TimerTask,
}

impl ScheduledActuator {
    /// Binds `channel` of `device` into the scheduler context.
    ///
    /// Fails with a range error when the channel does not exist on the
    /// device; per-tick reads against a validated device therefore cannot
    /// range-fail.
    pub fn new(
        scheduler: &Scheduler,
        channel: usize,
        device: Arc<dyn PositionDevice>,
    ) -> Result<Self, DeviceError> {
        if channel >= device.channels() {
            return Err(DeviceError::ChannelOutOfRange {
                channel,
                channels: device.channels(),
            });
        }
        let clock = scheduler.clock();
        let now = clock.now_us();
        // Seed the cache from the device: construction alone never counts
        // as an observed change.
        let seed = device.read(channel).unwrap_or(0.0);
        let shared = Arc::new(ActuatorShared {
            channel,
            clock,
            device: Mutex::new(Some(device)),
            run: Arc::new(Mutex::new(RunState {
                last_value: seed,
                delay_budget_us: 0,
                delay_start_us: now,
                prev_tick_us: now,
                delta_time_us: 0,
                min: DEFAULT_MIN,
                max: DEFAULT_MAX,
                step: 1.0,
            })),
            dispatcher: EventDispatcher::new(),
        });
        Ok(Self {
            shared,
            task: TimerTask::new(scheduler),
        })
    }

    /// Registers `handler` for `trigger`; `priority < 1` front-inserts,
    /// `>= 1` appends.
    pub fn irq(&self, handler: Handler<TickContext>, trigger: Trigger, priority: i32) {
        self.shared.dispatcher.irq(handler, trigger, priority);
    }

    /// Starts ticking: fires `Init` once, then registers the per-tick
    /// algorithm at the given mode and rate.
    pub fn start(&self, mode: TimerMode, rate: Rate) -> Result<(), SchedulerError> {
        let shared = Arc::clone(&self.shared);
        let task = self.task.inner_weak();
        let callback = Arc::new(move || -> crate::source::BoxTickFuture {
            let shared = Arc::clone(&shared);
            let task = task.clone();
            Box::pin(async move {
                shared.run_tick(&task);
            })
        });

        let ctx = self.shared.snapshot(self.task.running());
        self.shared.dispatcher.fire(Trigger::Init, &ctx);

        let config = TaskConfig {
            mode,
            rate,
            timeout: None,
            tick_while_paused: true,
        };
        self.task.init(config, callback)
    }

    /// Pauses the underlying task; subsequent ticks classify as `Paused`.
    pub fn pause(&self) {
        self.task.pause();
    }

    /// Stops the underlying task (entry deregistered) and fires `Stop`.
    pub fn stop(&self) {
        self.task.stop();
        let ctx = self.shared.snapshot(false);
        self.shared.dispatcher.fire(Trigger::Stop, &ctx);
    }

    /// Reapplies the current mode and rate.
    pub fn reset(&self) -> Result<(), SchedulerError> {
        self.task.reset()
    }

    /// Stops, fires `Deinit` once, and clears every handler registration.
    pub fn deinit(&self) {
        self.task.deinit();
        let ctx = self.shared.snapshot(false);
        self.shared.dispatcher.fire(Trigger::Deinit, &ctx);
        self.shared.dispatcher.clear();
    }

    /// Busy-polls until the task stops running.
    ///
    /// Returns only once something stops the task; see
    /// [`TimerTask::waiting`] for the one-shot caveat.
    pub async fn waiting(&self) {
        self.task.waiting().await;
    }

    /// True while the underlying task is running.
    pub fn running(&self) -> bool {
        self.task.running()
    }

    /// Programs a delay window: until it elapses, ticks fire only `Delay`.
    pub fn delay(&self, delay: Duration) {
        let mut run = self.shared.run.lock().unwrap_or_else(PoisonError::into_inner);
        run.delay_budget_us = delay.as_micros().min(i64::MAX as u128) as i64;
    }

    /// Millisecond convenience over [`delay`](Self::delay).
    pub fn delay_ms(&self, ms: u64) {
        self.delay(Duration::from_millis(ms));
    }

    /// Swaps in a device; validates the bound channel against it.
    ///
    /// Re-seeds the cached last-observed value, so the attachment itself
    /// does not raise `Changed` on the next tick.
    pub fn attach(&self, device: Arc<dyn PositionDevice>) -> Result<(), DeviceError> {
        if self.shared.channel >= device.channels() {
            return Err(DeviceError::ChannelOutOfRange {
                channel: self.shared.channel,
                channels: device.channels(),
            });
        }
        if let Ok(v) = device.read(self.shared.channel) {
            self.shared
                .run
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last_value = v;
        }
        *self
            .shared
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(device);
        Ok(())
    }

    /// Detaches the device; subsequent ticks classify as `Paused`.
    pub fn detach(&self) {
        *self
            .shared
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Reads the bound channel.
    pub fn read(&self) -> Result<f64, DeviceError> {
        self.shared.with_device(|dev, ch| dev.read(ch))
    }

    /// Writes the bound channel.
    pub fn write(&self, value: f64) -> Result<(), DeviceError> {
        self.shared.with_device(|dev, ch| dev.write(ch, value))
    }

    /// Current position; alias of [`read`](Self::read).
    pub fn position(&self) -> Result<f64, DeviceError> {
        self.read()
    }

    /// Moves to a position; alias of [`write`](Self::write).
    pub fn set_position(&self, value: f64) -> Result<(), DeviceError> {
        self.write(value)
    }

    /// Configured [min, max] bounds.
    pub fn bounds(&self) -> (f64, f64) {
        let run = self.shared.run.lock().unwrap_or_else(PoisonError::into_inner);
        (run.min, run.max)
    }

    /// Sets the [min, max] bounds used by the `Limit`/`Moved` split.
    pub fn set_bounds(&self, min: f64, max: f64) {
        let mut run = self.shared.run.lock().unwrap_or_else(PoisonError::into_inner);
        run.min = min;
        run.max = max;
    }

    /// Advisory stride exposed to `Moved` handlers.
    pub fn step(&self) -> f64 {
        self.shared
            .run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .step
    }

    /// Sets the advisory stride.
    pub fn set_step(&self, step: f64) {
        self.shared
            .run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .step = step;
    }

    /// Elapsed time between the two most recent ticks. Inspection only;
    /// gates no trigger.
    pub fn delta_time(&self) -> Duration {
        let run = self.shared.run.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_micros(run.delta_time_us.max(0) as u64)
    }

    /// The underlying task handle (for scheduler-level operations).
    pub fn task(&self) -> &TimerTask {
        &self.task
    }
}

impl ActuatorShared {
    fn with_device<T>(
        &self,
        f: impl FnOnce(&dyn PositionDevice, usize) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        let device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        match device.as_ref() {
            Some(dev) => f(dev.as_ref(), self.channel),
            None => Err(DeviceError::Detached),
        }
    }

    /// The seven-step classification algorithm. Runs inside the timer
    /// callback; trigger handlers are invoked after the state lock is
    /// released.
    fn run_tick(&self, task: &Weak<TaskInner>) {
        let now = self.clock.now_us();
        let running = task.upgrade().map(|t| t.is_running()).unwrap_or(false);
        let device = self
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut fired: Vec<Trigger> = Vec::with_capacity(4);
        let ctx = {
            let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);

            // Steps 1–2 share one elapsed reading: an exhausted window
            // re-anchors to now (with a zero budget that happens every
            // tick, keeping a freshly programmed delay measured from the
            // latest tick), and the same reading decides whether this tick
            // is still inside the window — so the tick that exhausts the
            // window proceeds to Loop instead of restarting the delay.
            let elapsed = ticks_diff(now, run.delay_start_us);
            if elapsed >= run.delay_budget_us {
                run.delay_start_us = now;
            }

            let previous = run.last_value;
            let mut value = previous;

            // Step 2: inside the window nothing downstream runs.
            if elapsed < run.delay_budget_us {
                fired.push(Trigger::Delay);
            } else {
                // Step 3.
                run.delay_budget_us = 0;
                fired.push(Trigger::Loop);

                // Step 4. A read failure leaves the value unchanged (no
                // Changed); a *detached* device is classified in step 5.
                if let Some(dev) = &device {
                    if let Ok(v) = dev.read(self.channel) {
                        value = v;
                    }
                }
                if value != run.last_value {
                    run.last_value = value;
                    fired.push(Trigger::Changed);
                }

                // Steps 5/6.
                if !running || device.is_none() {
                    fired.push(Trigger::Paused);
                } else {
                    fired.push(Trigger::Running);
                    if value > run.max || value < run.min {
                        fired.push(Trigger::Limit);
                    } else {
                        fired.push(Trigger::Moved);
                    }
                }
            }

            // Step 7: delta-time is recomputed on every branch.
            run.delta_time_us = ticks_diff(now, run.prev_tick_us);
            run.prev_tick_us = now;

            TickContext {
                channel: self.channel,
                value,
                last_value: previous,
                delta_time_us: run.delta_time_us,
                running,
                min: run.min,
                max: run.max,
                step: run.step,
                device: device.clone(),
                run: Arc::clone(&self.run),
            }
        };

        for trigger in fired {
            self.dispatcher.fire(trigger, &ctx);
        }
    }

    /// Context snapshot outside a tick (Init/Stop/Deinit firings).
    fn snapshot(&self, running: bool) -> TickContext {
        let device = self
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        TickContext {
            channel: self.channel,
            value: run.last_value,
            last_value: run.last_value,
            delta_time_us: run.delta_time_us,
            running,
            min: run.min,
            max: run.max,
            step: run.step,
            device,
            run: Arc::clone(&self.run),
        }
    }
}
