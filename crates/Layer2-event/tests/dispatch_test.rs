//! 디스패치 통합 테스트 - 순서, 등록/해제, 실패 격리, 비동기 발행
//!
//! `cargo test -p switchboard-event --test dispatch_test`

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use switchboard_event::{
    BlockingPool, ClosureListener, Event, EventDispatcher, EventError, HandlerPanicked,
    HandlerSignature, Handlers, Listener, ListenerId, ParamType, Priority, ReturnType,
    SignatureViolation,
};
use switchboard_foundation::{EngineConfig, SwitchboardConfig};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Default)]
struct Trail {
    steps: Vec<String>,
}
impl Event for Trail {}

#[derive(Debug, Default)]
struct Probe {
    hits: usize,
}
impl Event for Probe {}

#[derive(Debug)]
struct Unheard;
impl Event for Unheard {}

/// Appends its handler names to the trail and counts invocations.
#[derive(Default)]
struct Recorder {
    calls: AtomicUsize,
}

impl Listener for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn declare(&self, handlers: &mut Handlers<Self>) {
        handlers
            .on_with_priority("last", Priority::LAST, |me: &Self, trail: &mut Trail| {
                me.record(trail, "last")
            })
            .on_with_priority("late", Priority::LATE, |me: &Self, trail: &mut Trail| {
                me.record(trail, "late")
            })
            .on("normal", |me: &Self, trail: &mut Trail| me.record(trail, "normal"))
            .on_with_priority("first", Priority::FIRST, |me: &Self, trail: &mut Trail| {
                me.record(trail, "first")
            })
            .on_with_priority("early", Priority::EARLY, |me: &Self, trail: &mut Trail| {
                me.record(trail, "early")
            })
            .on_with_priority("custom", Priority(-5), |me: &Self, trail: &mut Trail| {
                me.record(trail, "custom")
            })
            .on("probe", |me: &Self, probe: &mut Probe| {
                me.calls.fetch_add(1, Ordering::SeqCst);
                probe.hits += 1;
                Ok(())
            });
    }
}

impl Recorder {
    fn record(&self, trail: &mut Trail, step: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        trail.steps.push(step.to_string());
        Ok(())
    }
}

fn probe_listener(name: &str, handlers: usize) -> Arc<ClosureListener> {
    (0..handlers)
        .fold(ClosureListener::builder(name), |builder, i| {
            builder.on(format!("hit-{i}"), |probe: &mut Probe| {
                probe.hits += 1;
                Ok(())
            })
        })
        .build()
}

fn small_engine() -> EngineConfig {
    EngineConfig {
        thread_name: "dispatch-test".to_string(),
        max_workers: 8,
        keep_alive_ms: 200,
        shutdown_grace_ms: 2000,
    }
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_handlers_run_in_priority_order() {
    let dispatcher = EventDispatcher::inline();
    dispatcher.register_listener(&Arc::new(Recorder::default())).unwrap();

    let trail = dispatcher.publish(Trail::default()).unwrap();
    assert_eq!(
        trail.steps,
        vec!["first", "early", "custom", "normal", "late", "last"]
    );
}

#[test]
fn test_equal_priority_runs_in_registration_order() {
    let dispatcher = EventDispatcher::inline();
    let order = Arc::new(Mutex::new(Vec::new()));

    let listeners: Vec<_> = (0..4)
        .map(|i| {
            let order = Arc::clone(&order);
            ClosureListener::builder(format!("l{i}"))
                .on("push", move |_: &mut Probe| {
                    order.lock().push(i);
                    Ok(())
                })
                .build()
        })
        .collect();
    for listener in &listeners {
        dispatcher.register_listener(listener).unwrap();
    }

    dispatcher.publish(Probe::default()).unwrap();
    assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
}

#[test]
fn test_mutations_visible_to_later_handlers_and_producer() {
    let dispatcher = EventDispatcher::inline();
    let listener = ClosureListener::builder("mutators")
        .on_with_priority("seed", Priority::EARLY, |trail: &mut Trail| {
            trail.steps.push("seed".into());
            Ok(())
        })
        .on("observe", |trail: &mut Trail| {
            anyhow::ensure!(trail.steps == ["seed"], "seed not visible");
            trail.steps.push("observed".into());
            Ok(())
        })
        .build();
    dispatcher.register_listener(&listener).unwrap();

    let trail = dispatcher.publish(Trail::default()).unwrap();
    assert_eq!(trail.steps, vec!["seed", "observed"]);
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_duplicate_registration_is_idempotent() {
    let dispatcher = EventDispatcher::inline();
    let recorder = Arc::new(Recorder::default());

    assert_eq!(dispatcher.register_listener(&recorder).unwrap(), 7);
    assert_eq!(dispatcher.register_listener(&recorder).unwrap(), 0);
    assert_eq!(dispatcher.register_listener(&Arc::clone(&recorder)).unwrap(), 0);

    let trail = dispatcher.publish(Trail::default()).unwrap();
    assert_eq!(trail.steps.len(), 6);
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 6);
    assert_eq!(dispatcher.listener_count(), 1);
}

#[test]
fn test_unregister_removes_all_event_types() {
    let dispatcher = EventDispatcher::inline();
    let recorder = Arc::new(Recorder::default());
    let other = probe_listener("other", 1);
    dispatcher.register_listener(&recorder).unwrap();
    dispatcher.register_listener(&other).unwrap();

    assert_eq!(dispatcher.unregister_listener(&recorder), 7);
    assert!(!dispatcher.is_registered(&recorder));
    assert_eq!(dispatcher.handler_count::<Trail>(), 0);
    assert_eq!(dispatcher.handler_count::<Probe>(), 1);

    let trail = dispatcher.publish(Trail::default()).unwrap();
    let probe = dispatcher.publish(Probe::default()).unwrap();
    assert!(trail.steps.is_empty());
    assert_eq!(probe.hits, 1);
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);

    // unknown listener is a no-op
    assert_eq!(dispatcher.unregister_listener(&recorder), 0);
    assert_eq!(dispatcher.unregister_listener(&Arc::new(Recorder::default())), 0);
}

#[test]
fn test_registration_keeps_listener_alive() {
    let dispatcher = EventDispatcher::inline();
    let listener = probe_listener("ephemeral", 1);
    let weak = Arc::downgrade(&listener);
    dispatcher.register_listener(&listener).unwrap();
    drop(listener);

    let listener = weak.upgrade().expect("registered listener was freed");
    assert!(dispatcher.is_registered(&listener));
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 1);

    assert_eq!(dispatcher.unregister_listener(&listener), 1);
    drop(listener);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_new_listener_never_takes_over_a_dropped_ones_identity() {
    let dispatcher = EventDispatcher::inline();
    let first = probe_listener("first", 1);
    let first_id = ListenerId::of(&first);
    dispatcher.register_listener(&first).unwrap();
    drop(first);

    for i in 0..64 {
        let next = probe_listener(&format!("next-{i}"), 1);
        assert_ne!(ListenerId::of(&next), first_id);
        assert_eq!(dispatcher.register_listener(&next).unwrap(), 1);
        assert_eq!(dispatcher.unregister_listener(&next), 1);
    }

    // the first listener's handler is untouched
    assert_eq!(dispatcher.handler_count::<Probe>(), 1);
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 1);
}

#[test]
fn test_duplicate_handler_name_is_rejected() {
    let dispatcher = EventDispatcher::inline();
    let listener = ClosureListener::builder("twice")
        .on("handle", |probe: &mut Probe| {
            probe.hits += 1;
            Ok(())
        })
        .on("handle", |probe: &mut Probe| {
            probe.hits += 10;
            Ok(())
        })
        .build();

    match dispatcher.register_listener(&listener) {
        Err(EventError::DuplicateHandler {
            listener,
            handler,
            event,
        }) => {
            assert_eq!(listener, "twice");
            assert_eq!(handler, "handle");
            assert!(event.ends_with("Probe"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!dispatcher.is_registered(&listener));
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 0);
}

#[test]
fn test_same_handler_name_for_different_events_is_allowed() {
    let dispatcher = EventDispatcher::inline();
    let listener = ClosureListener::builder("split")
        .on("handle", |probe: &mut Probe| {
            probe.hits += 1;
            Ok(())
        })
        .on("handle", |trail: &mut Trail| {
            trail.steps.push("handle".to_string());
            Ok(())
        })
        .build();

    assert_eq!(dispatcher.register_listener(&listener).unwrap(), 2);
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 1);
    assert_eq!(dispatcher.publish(Trail::default()).unwrap().steps, vec!["handle"]);
}

#[test]
fn test_publish_without_handlers_returns_event() {
    let dispatcher = EventDispatcher::inline();
    dispatcher.register_listener(&Arc::new(Recorder::default())).unwrap();

    let probe = dispatcher.publish(Probe { hits: 41 }).unwrap();
    assert_eq!(probe.hits, 42);

    let unheard = dispatcher.publish(Unheard);
    assert!(unheard.is_ok());
}

struct Bridged {
    signature: HandlerSignature,
}

impl Listener for Bridged {
    fn name(&self) -> &str {
        "plugin"
    }

    fn declare(&self, handlers: &mut Handlers<Self>) {
        handlers
            .on("typed", |_: &Self, probe: &mut Probe| {
                probe.hits += 1;
                Ok(())
            })
            .bridged(
                "script",
                Priority::NORMAL,
                self.signature.clone(),
                |_: &Self, event| {
                    let probe = event
                        .downcast_mut::<Probe>()
                        .ok_or_else(|| anyhow::anyhow!("not a probe"))?;
                    probe.hits += 100;
                    Ok(())
                },
            );
    }
}

#[test]
fn test_invalid_bridged_handler_registers_nothing() {
    let dispatcher = EventDispatcher::inline();
    let listener = Arc::new(Bridged {
        signature: HandlerSignature::new(
            vec![ParamType::event::<Probe>()],
            ReturnType::Value("bool"),
        ),
    });

    let err = dispatcher.register_listener(&listener).unwrap_err();
    match err {
        EventError::InvalidHandlerSignature {
            listener,
            handler,
            violation,
        } => {
            assert_eq!(listener, "plugin");
            assert_eq!(handler, "script");
            assert_eq!(
                violation,
                SignatureViolation::ReturnType {
                    found: "bool".to_string()
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(!dispatcher.is_registered(&listener));
    assert_eq!(dispatcher.handler_count::<Probe>(), 0);
}

#[test]
fn test_valid_bridged_handler_dispatches() {
    let dispatcher = EventDispatcher::inline();
    let listener = Arc::new(Bridged {
        signature: HandlerSignature::handler_of::<Probe>(),
    });

    assert_eq!(dispatcher.register_listener(&listener).unwrap(), 2);
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 101);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("quota exceeded for {0}")]
struct QuotaExceeded(String);

#[test]
fn test_failing_handler_does_not_stop_siblings() {
    let dispatcher = EventDispatcher::inline();
    let ran = Arc::new(Mutex::new(Vec::new()));

    let (h1, h3) = (Arc::clone(&ran), Arc::clone(&ran));
    let listener = ClosureListener::builder("trio")
        .on_with_priority("h1", Priority(1), move |_: &mut Probe| {
            h1.lock().push("h1");
            Ok(())
        })
        .on_with_priority("h2", Priority(2), |_: &mut Probe| {
            Err(QuotaExceeded("alice".into()).into())
        })
        .on_with_priority("h3", Priority(3), move |_: &mut Probe| {
            h3.lock().push("h3");
            Ok(())
        })
        .build();
    dispatcher.register_listener(&listener).unwrap();

    let err = dispatcher.publish(Probe::default()).unwrap_err();
    assert_eq!(*ran.lock(), vec!["h1", "h3"]);

    let execution = err.as_execution().expect("execution error");
    assert_eq!(execution.handler().handler(), "h2");
    assert_eq!(execution.handler().listener(), "trio");
    assert_eq!(execution.suppressed(), 0);

    let cause = execution.cause_as::<QuotaExceeded>().expect("original cause");
    assert_eq!(cause.0, "alice");
}

#[test]
fn test_panicking_handler_is_reported() {
    let dispatcher = EventDispatcher::inline();
    let after = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&after);

    let listener = ClosureListener::builder("volatile")
        .on_with_priority("explode", Priority::EARLY, |_: &mut Probe| -> anyhow::Result<()> {
            panic!("handler blew up")
        })
        .on("after", move |_: &mut Probe| {
            seen.store(true, Ordering::SeqCst);
            Ok(())
        })
        .build();
    dispatcher.register_listener(&listener).unwrap();

    let err = dispatcher.publish(Probe::default()).unwrap_err();
    assert!(after.load(Ordering::SeqCst));

    let execution = err.as_execution().unwrap();
    assert_eq!(execution.handler().handler(), "explode");
    let panicked = execution.cause_as::<HandlerPanicked>().unwrap();
    assert_eq!(panicked.message, "handler blew up");
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_publish_and_unregister_sees_whole_sets() {
    const STABLE: usize = 3;
    const TRANSIENT: usize = 5;
    const PUBLISHERS: usize = 4;
    const ROUNDS: usize = 2_000;

    let dispatcher = Arc::new(EventDispatcher::inline());
    let stable = probe_listener("stable", STABLE);
    dispatcher.register_listener(&stable).unwrap();

    let barrier = Arc::new(Barrier::new(PUBLISHERS + 1));
    let mut publishers = Vec::new();

    for _ in 0..PUBLISHERS {
        let dispatcher = Arc::clone(&dispatcher);
        let barrier = Arc::clone(&barrier);
        publishers.push(thread::spawn(move || {
            barrier.wait();
            let mut observed = Vec::with_capacity(ROUNDS);
            for _ in 0..ROUNDS {
                observed.push(dispatcher.publish(Probe::default()).unwrap().hits);
            }
            observed
        }));
    }

    let mutator = {
        let dispatcher = Arc::clone(&dispatcher);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..200 {
                let transient = probe_listener("transient", TRANSIENT);
                dispatcher.register_listener(&transient).unwrap();
                thread::yield_now();
                assert_eq!(dispatcher.unregister_listener(&transient), TRANSIENT);
            }
        })
    };

    for publisher in publishers {
        for hits in publisher.join().unwrap() {
            assert!(
                hits == STABLE || hits == STABLE + TRANSIENT,
                "partial handler set observed: {hits}"
            );
        }
    }
    mutator.join().unwrap();
    assert_eq!(dispatcher.handler_count::<Probe>(), STABLE);
}

#[test]
fn test_concurrent_registration_of_distinct_listeners() {
    let dispatcher = Arc::new(EventDispatcher::inline());
    let barrier = Arc::new(Barrier::new(8));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let listener = probe_listener(&format!("worker-{i}"), 2);
                barrier.wait();
                dispatcher.register_listener(&listener).unwrap();
                listener
            })
        })
        .collect();

    let listeners: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(dispatcher.listener_count(), 8);
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 16);
    drop(listeners);
}

// ============================================================================
// Asynchronous publish
// ============================================================================

fn slow_listener(delay: Duration) -> Arc<ClosureListener> {
    ClosureListener::builder("slow")
        .on("sleep", move |probe: &mut Probe| {
            thread::sleep(delay);
            probe.hits += 1;
            Ok(())
        })
        .on_with_priority("fail", Priority::LATE, |probe: &mut Probe| {
            anyhow::ensure!(probe.hits < 10, "too many hits: {}", probe.hits);
            Ok(())
        })
        .build()
}

#[test]
fn test_publish_async_does_not_block_caller() {
    let config = SwitchboardConfig {
        engine: small_engine(),
        ..SwitchboardConfig::default()
    };
    let dispatcher = EventDispatcher::start(&config).unwrap();
    dispatcher
        .register_listener(&slow_listener(Duration::from_millis(300)))
        .unwrap();

    let started = Instant::now();
    let handle = dispatcher.publish_async(Probe::default());
    assert!(started.elapsed() < Duration::from_millis(250));

    let probe = handle.wait().unwrap();
    assert_eq!(probe.hits, 1);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_async_outcome_matches_sync_outcome() {
    let dispatcher = EventDispatcher::new(Arc::new(BlockingPool::from_handle(
        tokio::runtime::Handle::current(),
    )));
    dispatcher
        .register_listener(&slow_listener(Duration::from_millis(20)))
        .unwrap();

    let sync_ok = dispatcher.publish(Probe::default()).unwrap();
    let async_ok = dispatcher.publish_async(Probe::default()).await.unwrap();
    assert_eq!(sync_ok.hits, async_ok.hits);

    let sync_err = dispatcher.publish(Probe { hits: 20 }).unwrap_err();
    let async_err = dispatcher
        .publish_async(Probe { hits: 20 })
        .await
        .unwrap_err();
    assert_eq!(sync_err.to_string(), async_err.to_string());
    assert_eq!(
        async_err.as_execution().unwrap().handler().handler(),
        "fail"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_many_async_publishes_complete() {
    let dispatcher = EventDispatcher::new(Arc::new(BlockingPool::from_handle(
        tokio::runtime::Handle::current(),
    )));
    dispatcher.register_listener(&probe_listener("burst", 2)).unwrap();

    let handles: Vec<_> = (0..64)
        .map(|_| dispatcher.publish_async(Probe::default()))
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().hits, 2);
    }
}

#[test]
fn test_dropped_handle_does_not_cancel_dispatch() {
    let dispatcher = EventDispatcher::start(&SwitchboardConfig {
        engine: small_engine(),
        ..SwitchboardConfig::default()
    })
    .unwrap();

    let done = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done);
    let listener = ClosureListener::builder("counter")
        .on("count", move |_: &mut Probe| {
            thread::sleep(Duration::from_millis(20));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();
    dispatcher.register_listener(&listener).unwrap();

    drop(dispatcher.publish_async(Probe::default()));

    let deadline = Instant::now() + Duration::from_secs(5);
    while done.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[test]
fn test_publish_async_after_shutdown() {
    let dispatcher = EventDispatcher::start(&SwitchboardConfig {
        engine: small_engine(),
        ..SwitchboardConfig::default()
    })
    .unwrap();
    dispatcher.register_listener(&probe_listener("p", 1)).unwrap();

    dispatcher.shutdown();
    assert!(dispatcher.engine().is_shutdown());

    let outcome = dispatcher.publish_async(Probe::default()).wait();
    assert!(matches!(outcome, Err(EventError::EngineShutdown)));

    // synchronous publishing is unaffected
    assert_eq!(dispatcher.publish(Probe::default()).unwrap().hits, 1);
}

#[test]
fn test_inline_engine_after_shutdown() {
    let dispatcher = EventDispatcher::inline();
    dispatcher.shutdown();

    let mut handle = dispatcher.publish_async(Probe::default());
    assert!(matches!(
        handle.try_take(),
        Some(Err(EventError::EngineShutdown))
    ));
}
