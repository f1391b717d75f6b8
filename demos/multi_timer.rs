//! Several logical timers multiplexed over one background scan loop.
//!
//! Run with: `cargo run --example multi_timer`

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tickmux::clock::MonotonicClock;
use tickmux::source::BoxTickFuture;
use tickmux::{Rate, Scheduler, TaskConfig, ThreadedTimerSource, TimerTask};

fn counting(label: &'static str, counter: &Arc<AtomicU32>) -> tickmux::TickFn {
    let counter = Arc::clone(counter);
    Arc::new(move || -> BoxTickFuture {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[{label}] fire #{n}");
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Arc::new(MonotonicClock::new());
    let source = ThreadedTimerSource::new(clock.clone());
    let sched = Scheduler::new(source.clone(), clock);

    let fast = Arc::new(AtomicU32::new(0));
    let slow = Arc::new(AtomicU32::new(0));
    let once = Arc::new(AtomicU32::new(0));

    // Three independent cadences share the single scan loop.
    let fast_task = TimerTask::new(&sched);
    fast_task.init(
        TaskConfig::periodic(Rate::Hz(20.0)),
        counting("fast 20Hz", &fast),
    )?;

    let slow_task = TimerTask::new(&sched);
    slow_task.init(
        TaskConfig::periodic(Rate::Period(Duration::from_millis(130))),
        counting("slow 130ms", &slow),
    )?;

    let once_task = TimerTask::new(&sched);
    once_task.init(
        TaskConfig::one_shot(Rate::Period(Duration::from_millis(200))),
        counting("one-shot 200ms", &once),
    )?;

    tokio::time::sleep(Duration::from_millis(500)).await;
    sched.stop_all();

    println!(
        "totals: fast={} slow={} once={}",
        fast.load(Ordering::SeqCst),
        slow.load(Ordering::SeqCst),
        once.load(Ordering::SeqCst)
    );
    Ok(())
}
