//! Trigger classification properties of the actuator layer, driven
//! deterministically with a manual clock and an externally ticked source.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickmux::clock::ManualClock;
use tickmux::{
    DeviceError, MemoryDevice, PositionDevice, Rate, ScheduledActuator, Scheduler, Sweep,
    TickedTimerSource, TimerMode, TimerSource, Trigger,
};

const TICK: Duration = Duration::from_millis(10);

struct Rig {
    clock: ManualClock,
    source: Arc<TickedTimerSource>,
    sched: Scheduler,
    device: Arc<MemoryDevice>,
    servo: ScheduledActuator,
    log: Arc<Mutex<Vec<Trigger>>>,
}

/// One actuator on channel 0 of a two-channel device, with a recording
/// handler bound to every trigger.
fn rig() -> Rig {
    let clock = ManualClock::new();
    let source = TickedTimerSource::new(Arc::new(clock.clone()));
    let sched = Scheduler::new(source.clone(), Arc::new(clock.clone()));
    let device = Arc::new(MemoryDevice::new(2));
    let servo = ScheduledActuator::new(&sched, 0, device.clone()).unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    for trigger in Trigger::ALL {
        let log = Arc::clone(&log);
        servo.irq(
            Arc::new(move |_ctx| log.lock().unwrap().push(trigger)),
            trigger,
            1,
        );
    }
    Rig {
        clock,
        source,
        sched,
        device,
        servo,
        log,
    }
}

impl Rig {
    async fn step(&self) {
        self.clock.advance_ms(10);
        self.source.tick().await;
    }

    /// Triggers recorded since the previous drain.
    fn drain(&self) -> Vec<Trigger> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    fn start(&self) {
        self.servo
            .start(TimerMode::Periodic, Rate::Period(TICK))
            .unwrap();
    }
}

#[tokio::test]
async fn test_start_fires_init_once_then_ticks_classify() {
    let rig = rig();
    rig.start();
    assert_eq!(rig.drain(), vec![Trigger::Init]);

    // Value 0 matches the seeded cache: no Changed on the first tick.
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Running, Trigger::Moved]
    );
}

#[tokio::test]
async fn test_changed_fires_exactly_on_observed_transitions() {
    let clock = ManualClock::new();
    let source = TickedTimerSource::new(Arc::new(clock.clone()));
    let sched = Scheduler::new(source.clone(), Arc::new(clock.clone()));
    let device = Arc::new(MemoryDevice::new(1));
    device.write(0, 10.0).unwrap();

    let servo = ScheduledActuator::new(&sched, 0, device.clone()).unwrap();
    let changed = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&changed);
    servo.irq(
        Arc::new(move |_ctx| {
            c.fetch_add(1, Ordering::SeqCst);
        }),
        Trigger::Changed,
        1,
    );
    servo
        .start(TimerMode::Periodic, Rate::Period(TICK))
        .unwrap();

    for value in [10.0, 10.0, 20.0, 20.0, 30.0] {
        device.write(0, value).unwrap();
        clock.advance_ms(10);
        source.tick().await;
    }
    assert_eq!(changed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_limit_outside_bounds_moved_inside() {
    let rig = rig();
    rig.start();
    rig.drain();

    rig.device.write(0, 181.0).unwrap();
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Changed, Trigger::Running, Trigger::Limit]
    );

    // The boundary itself is inside the range.
    rig.device.write(0, 180.0).unwrap();
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Changed, Trigger::Running, Trigger::Moved]
    );
}

#[tokio::test]
async fn test_delay_window_fires_only_delay_until_exhausted() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    rig.servo.delay_ms(100);
    for _ in 0..9 {
        rig.step().await;
    }
    assert_eq!(rig.drain(), vec![Trigger::Delay; 9]);

    // The tick at the boundary exits the window and resumes classification.
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Running, Trigger::Moved]
    );

    // The budget was consumed, not rearmed.
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Running, Trigger::Moved]
    );
}

#[tokio::test]
async fn test_pause_classifies_paused_and_keeps_entry() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    rig.servo.pause();
    assert!(!rig.servo.running());
    rig.step().await;
    assert_eq!(rig.drain(), vec![Trigger::Loop, Trigger::Paused]);

    let id = rig.servo.task().timer_id().unwrap();
    assert!(rig.source.contains(id));

    rig.servo.reset().unwrap();
    assert!(rig.servo.running());
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Running, Trigger::Moved]
    );
}

#[tokio::test]
async fn test_changed_fires_before_paused_on_a_paused_tick() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    // A transition observed while paused is still a transition: the cache
    // compare runs before the running classification.
    rig.servo.pause();
    rig.device.write(0, 25.0).unwrap();
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Changed, Trigger::Paused]
    );

    // The cache was updated, so the same value is no longer a change.
    rig.step().await;
    assert_eq!(rig.drain(), vec![Trigger::Loop, Trigger::Paused]);
}

#[tokio::test]
async fn test_detached_device_classifies_paused() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    rig.servo.detach();
    assert!(rig.servo.running());
    assert!(matches!(rig.servo.read(), Err(DeviceError::Detached)));
    rig.step().await;
    assert_eq!(rig.drain(), vec![Trigger::Loop, Trigger::Paused]);

    // Re-attachment re-seeds the cache, so the swap itself is not a change.
    let replacement = Arc::new(MemoryDevice::new(1));
    replacement.write(0, 45.0).unwrap();
    rig.servo.attach(replacement).unwrap();
    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Running, Trigger::Moved]
    );
}

#[tokio::test]
async fn test_attach_rejects_missing_channel() {
    let rig = rig();
    let narrow = Arc::new(MemoryDevice::new(0));
    assert!(matches!(
        rig.servo.attach(narrow),
        Err(DeviceError::ChannelOutOfRange { channel: 0, channels: 0 })
    ));
}

#[tokio::test]
async fn test_stop_deregisters_and_fires_stop() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    let id = rig.servo.task().timer_id().unwrap();
    rig.servo.stop();
    assert_eq!(rig.drain(), vec![Trigger::Stop]);
    assert!(!rig.servo.running());
    assert!(rig.servo.task().timer_id().is_none());
    assert!(!rig.source.contains(id));
    assert!(rig.source.is_empty());

    rig.step().await;
    assert!(rig.drain().is_empty());
}

#[tokio::test]
async fn test_repeated_stop_and_deinit_stay_idempotent() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    rig.servo.stop();
    assert_eq!(rig.drain(), vec![Trigger::Stop]);
    // A second stop is a no-op at the task layer; the trigger replays, the
    // registry does not change.
    rig.servo.stop();
    assert_eq!(rig.drain(), vec![Trigger::Stop]);
    assert!(rig.servo.task().timer_id().is_none());
    assert!(rig.source.is_empty());

    rig.servo.deinit();
    assert_eq!(rig.drain(), vec![Trigger::Deinit]);
    // The first deinit cleared the handlers, so a second one runs silently.
    rig.servo.deinit();
    assert!(rig.drain().is_empty());
}

#[tokio::test]
async fn test_stop_all_halts_the_task_without_a_stop_trigger() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    // The broadcast operates at the task layer; the actuator's own Stop
    // trigger fires only through its stop().
    rig.sched.stop_all();
    assert!(rig.drain().is_empty());
    assert!(!rig.servo.running());
    assert!(rig.source.is_empty());
}

#[tokio::test]
async fn test_deinit_fires_once_and_clears_handlers() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.drain();

    rig.servo.deinit();
    assert_eq!(rig.drain(), vec![Trigger::Deinit]);

    // Handlers are gone: a restarted actuator runs silently.
    rig.start();
    rig.step().await;
    assert!(rig.drain().is_empty());
}

#[tokio::test]
async fn test_one_shot_ticks_once() {
    let rig = rig();
    rig.servo
        .start(TimerMode::OneShot, Rate::Period(TICK))
        .unwrap();
    rig.drain();

    rig.step().await;
    assert_eq!(
        rig.drain(),
        vec![Trigger::Loop, Trigger::Running, Trigger::Moved]
    );
    assert!(rig.source.is_empty());

    rig.step().await;
    assert!(rig.drain().is_empty());
}

#[tokio::test]
async fn test_sweep_handler_drives_motion() {
    let rig = rig();
    let sweep = Arc::new(Mutex::new(Sweep::new((0.0, 2.0), 1.0)));
    let s = Arc::clone(&sweep);
    rig.servo.irq(
        Arc::new(move |ctx| {
            let value = s.lock().unwrap().advance();
            let _ = ctx.write(value);
        }),
        Trigger::Moved,
        1,
    );
    rig.start();

    let mut positions = Vec::new();
    for _ in 0..6 {
        rig.step().await;
        positions.push(rig.device.read(0).unwrap());
    }
    assert_eq!(positions, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]);
}

#[tokio::test]
async fn test_delta_time_tracks_tick_spacing() {
    let rig = rig();
    rig.start();
    rig.step().await;
    rig.step().await;
    assert_eq!(rig.servo.delta_time(), TICK);

    rig.clock.advance_ms(25);
    rig.source.tick().await;
    assert_eq!(rig.servo.delta_time(), Duration::from_millis(25));
}

#[tokio::test]
async fn test_handler_priority_and_panic_isolation() {
    let clock = ManualClock::new();
    let source = TickedTimerSource::new(Arc::new(clock.clone()));
    let sched = Scheduler::new(source.clone(), Arc::new(clock.clone()));
    let device = Arc::new(MemoryDevice::new(1));
    let servo = ScheduledActuator::new(&sched, 0, device).unwrap();

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let record = |label: &'static str| {
        let order = Arc::clone(&order);
        Arc::new(move |_ctx: &tickmux::TickContext| order.lock().unwrap().push(label))
    };

    servo.irq(record("appended-1"), Trigger::Loop, 1);
    servo.irq(record("front"), Trigger::Loop, 0);
    servo.irq(Arc::new(|_ctx| panic!("handler failure")), Trigger::Loop, 1);
    servo.irq(record("appended-2"), Trigger::Loop, 1);

    servo
        .start(TimerMode::Periodic, Rate::Period(TICK))
        .unwrap();
    clock.advance_ms(10);
    source.tick().await;

    // The panicking handler is isolated; the rest fire in priority order.
    assert_eq!(
        *order.lock().unwrap(),
        vec!["front", "appended-1", "appended-2"]
    );
}
