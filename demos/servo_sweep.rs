//! A servo channel swept back and forth by a `Moved` handler.
//!
//! Run with: `cargo run --example servo_sweep`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickmux::clock::MonotonicClock;
use tickmux::{
    MemoryDevice, Rate, ScheduledActuator, Scheduler, Sweep, ThreadedTimerSource, TimerMode,
    Trigger,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Arc::new(MonotonicClock::new());
    let source = ThreadedTimerSource::new(clock.clone());
    let sched = Scheduler::new(source, clock);

    let device = Arc::new(MemoryDevice::new(1));
    let servo = ScheduledActuator::new(&sched, 0, device)?;
    servo.set_bounds(0.0, 30.0);

    // The engine only classifies; this handler owns the motion.
    let sweep = Arc::new(Mutex::new(Sweep::new(servo.bounds(), 5.0)));
    let s = Arc::clone(&sweep);
    servo.irq(
        Arc::new(move |ctx| {
            let value = s.lock().unwrap().advance();
            let _ = ctx.write(value);
        }),
        Trigger::Moved,
        1,
    );
    servo.irq(
        Arc::new(|ctx| {
            println!(
                "changed: {:.0} -> {:.0} (dt {:?})",
                ctx.last_value(),
                ctx.value(),
                ctx.delta_time()
            );
        }),
        Trigger::Changed,
        1,
    );

    servo.start(TimerMode::Periodic, Rate::Period(Duration::from_millis(20)))?;
    tokio::time::sleep(Duration::from_millis(400)).await;

    // Hold position for a moment: only Delay fires inside the window.
    println!("holding for 100ms");
    servo.delay_ms(100);
    tokio::time::sleep(Duration::from_millis(200)).await;

    servo.stop();
    servo.waiting().await;
    println!("final position: {:.0}", servo.position()?);
    Ok(())
}
