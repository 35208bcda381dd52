//! Bench - 디스패치 처리량 측정

use anyhow::Context;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use switchboard_event::{ClosureListener, Event, EventDispatcher, Priority};
use switchboard_foundation::SwitchboardConfig;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct BenchEvent;

impl Event for BenchEvent {
    fn event_name(&self) -> &'static str {
        "bench.event"
    }
}

pub fn run(
    config: &SwitchboardConfig,
    listeners: usize,
    events: usize,
    asynchronous: bool,
) -> anyhow::Result<()> {
    let dispatcher =
        EventDispatcher::start(config).context("Failed to start execution engine")?;
    let delivered = Arc::new(AtomicU64::new(0));

    // spread priorities so the table has to keep them ordered
    let registered: Vec<Arc<ClosureListener>> = (0..listeners)
        .map(|i| {
            let delivered = Arc::clone(&delivered);
            let priority = Priority::from((i % 5) as i32 - 2);
            ClosureListener::builder(format!("bench-{i}"))
                .on_with_priority("count", priority, move |_: &mut BenchEvent| {
                    delivered.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
                .build()
        })
        .collect();
    for listener in &registered {
        dispatcher.register_listener(listener)?;
    }
    debug!(listeners = dispatcher.listener_count(), "Bench listeners registered");

    let started = Instant::now();
    let mut failures = 0usize;
    if asynchronous {
        let handles: Vec<_> = (0..events)
            .map(|_| dispatcher.publish_async(BenchEvent))
            .collect();
        for handle in handles {
            failures += usize::from(handle.wait().is_err());
        }
    } else {
        for _ in 0..events {
            failures += usize::from(dispatcher.publish(BenchEvent).is_err());
        }
    }
    let elapsed = started.elapsed();

    let delivered = delivered.load(Ordering::Relaxed);
    info!(
        events,
        listeners,
        delivered,
        failures,
        elapsed_ms = elapsed.as_millis() as u64,
        "Bench finished"
    );

    println!("mode:        {}", if asynchronous { "async" } else { "sync" });
    println!("listeners:   {listeners}");
    println!("events:      {events}");
    println!("deliveries:  {delivered}");
    println!("failures:    {failures}");
    println!("elapsed:     {elapsed:?}");
    println!("events/sec:  {:.0}", per_second(events as u64, elapsed));
    println!("deliveries/sec: {:.0}", per_second(delivered, elapsed));

    dispatcher.shutdown();
    Ok(())
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    count as f64 / secs
}
