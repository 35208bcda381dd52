//! Event Dispatcher - 리스너 등록 및 이벤트 발행
//!
//! ```text
//! producer ──publish(E)──────────► dispatch on caller thread ──► Result<E>
//!          ──publish_async(E)────► ExecutionEngine::submit ──► DispatchHandle<E>
//!                                        │
//!                                        ▼
//!                      HandlerTable snapshot (exact TypeId lookup)
//!                                        │
//!                         handlers in priority/registration order
//! ```

use crate::engine::{BlockingPool, ExecutionEngine, InlineEngine, Job};
use crate::error::{EventError, EventExecutionError, HandlerId, HandlerPanicked, Result};
use crate::event::{Event, EventType};
use crate::handle::DispatchHandle;
use crate::listener::{Listener, ListenerId};
use crate::registry::{discover, HandlerTable};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use switchboard_foundation::{DispatchConfig, SwitchboardConfig};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Public surface of the event system.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be
/// called from any thread.
pub struct EventDispatcher {
    table: Arc<HandlerTable>,
    engine: Arc<dyn ExecutionEngine>,
    config: DispatchConfig,
}

impl EventDispatcher {
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self::with_config(engine, DispatchConfig::default())
    }

    pub fn with_config(engine: Arc<dyn ExecutionEngine>, config: DispatchConfig) -> Self {
        Self {
            table: Arc::new(HandlerTable::new()),
            engine,
            config,
        }
    }

    /// Starts a [`BlockingPool`] from `config.engine` and wires it in.
    pub fn start(config: &SwitchboardConfig) -> Result<Self> {
        let pool = BlockingPool::start(&config.engine)?;
        Ok(Self::with_config(Arc::new(pool), config.dispatch.clone()))
    }

    /// Dispatcher whose asynchronous publishes run inline.
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineEngine::new()))
    }

    pub fn engine(&self) -> &Arc<dyn ExecutionEngine> {
        &self.engine
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers every handler `listener` declares.
    ///
    /// All declarations are validated first; if one is malformed, or a name is
    /// declared twice for one event type, nothing is registered. Handlers
    /// already registered for this listener are skipped. Returns the number of
    /// newly inserted handlers.
    ///
    /// The dispatcher keeps `listener` alive until it is unregistered.
    pub fn register_listener<L: Listener>(&self, listener: &Arc<L>) -> Result<usize> {
        let discovered = discover(listener)?;
        let declared = discovered.len();
        let inserted = self.table.insert(discovered);

        debug!(
            listener = listener.name(),
            listener_id = %ListenerId::of(listener),
            declared,
            inserted,
            "Listener registered"
        );
        Ok(inserted)
    }

    /// Removes every handler of `listener` across all event types.
    ///
    /// Unknown listeners are ignored. Publishes that already loaded their
    /// handler snapshot still run the removed handlers.
    pub fn unregister_listener<L: ?Sized>(&self, listener: &Arc<L>) -> usize {
        let listener_id = ListenerId::of(listener);
        let removed = self.table.remove(listener_id);

        debug!(listener_id = %listener_id, removed, "Listener unregistered");
        removed
    }

    pub fn is_registered<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.table.contains(ListenerId::of(listener))
    }

    pub fn handler_count<E: Event>(&self) -> usize {
        self.table.handler_count(&EventType::of::<E>())
    }

    pub fn listener_count(&self) -> usize {
        self.table.listener_count()
    }

    // ========================================================================
    // Publishing
    // ========================================================================

    /// Runs every handler of `E` on the calling thread and hands the event back.
    pub fn publish<E: Event>(&self, event: E) -> Result<E> {
        dispatch(&self.table, self.config.trace_deliveries, event)
    }

    /// Submits the dispatch to the engine and returns immediately.
    ///
    /// The handler snapshot is taken when the engine runs the job.
    pub fn publish_async<E: Event>(&self, event: E) -> DispatchHandle<E> {
        let (tx, rx) = oneshot::channel();
        let table = Arc::clone(&self.table);
        let trace_deliveries = self.config.trace_deliveries;

        let job: Job = Box::new(move || {
            let outcome = dispatch(&table, trace_deliveries, event);
            // receiver may have been dropped
            let _ = tx.send(outcome);
        });

        if let Err(err) = self.engine.submit(job) {
            warn!(
                engine = self.engine.name(),
                event = std::any::type_name::<E>(),
                error = %err,
                "Asynchronous publish rejected"
            );
        }

        DispatchHandle::new(rx)
    }

    /// Shuts the engine down. Synchronous publishing keeps working.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("engine", &self.engine.name())
            .field("listeners", &self.listener_count())
            .field("config", &self.config)
            .finish()
    }
}

/// Delivers `event` to its handlers in order.
///
/// Every handler runs even if an earlier one failed; the first failure is
/// returned once all of them have run.
fn dispatch<E: Event>(table: &HandlerTable, trace_deliveries: bool, mut event: E) -> Result<E> {
    let event_type = EventType::of::<E>();
    let Some(handlers) = table.handlers(&event_type) else {
        return Ok(event);
    };
    let event_name = event.event_name();

    let mut first_failure: Option<(HandlerId, anyhow::Error)> = None;
    let mut suppressed = 0;

    for registration in handlers.iter() {
        if trace_deliveries {
            trace!(
                event = event_name,
                handler = %registration.handler,
                priority = registration.priority.value(),
                "Delivering event"
            );
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let payload: &mut dyn Any = &mut event;
            (registration.callback)(payload)
        }));
        let result = outcome.unwrap_or_else(|payload| Err(HandlerPanicked::from_payload(payload).into()));

        if let Err(cause) = result {
            warn!(
                event = event_name,
                handler = %registration.handler,
                error = %cause,
                "Event handler failed"
            );
            if first_failure.is_none() {
                first_failure = Some((registration.handler.clone(), cause));
            } else {
                suppressed += 1;
            }
        }
    }

    match first_failure {
        None => Ok(event),
        Some((handler, cause)) => Err(EventError::EventExecution(EventExecutionError::new(
            event_name,
            handler,
            cause,
            suppressed,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ClosureListener, Priority};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counter(u32);
    impl Event for Counter {}

    #[test]
    fn test_publish_without_handlers() {
        let dispatcher = EventDispatcher::inline();
        let event = dispatcher.publish(Counter(3)).unwrap();
        assert_eq!(event.0, 3);
    }

    #[test]
    fn test_register_and_unregister() {
        let dispatcher = EventDispatcher::inline();
        let listener = ClosureListener::builder("adder")
            .on("add", |c: &mut Counter| {
                c.0 += 1;
                Ok(())
            })
            .build();

        assert_eq!(dispatcher.register_listener(&listener).unwrap(), 1);
        assert!(dispatcher.is_registered(&listener));
        assert_eq!(dispatcher.handler_count::<Counter>(), 1);
        assert_eq!(dispatcher.publish(Counter(0)).unwrap().0, 1);

        assert_eq!(dispatcher.unregister_listener(&listener), 1);
        assert!(!dispatcher.is_registered(&listener));
        assert_eq!(dispatcher.publish(Counter(0)).unwrap().0, 0);
    }

    #[test]
    fn test_first_failure_with_suppressed_count() {
        let dispatcher = EventDispatcher::inline();
        let ran = Arc::new(AtomicUsize::new(0));
        let tail = Arc::clone(&ran);

        let listener = ClosureListener::builder("failing")
            .on_with_priority("first", Priority::EARLY, |_: &mut Counter| {
                anyhow::bail!("first failure")
            })
            .on("second", |_: &mut Counter| anyhow::bail!("second failure"))
            .on_with_priority("tail", Priority::LATE, move |_: &mut Counter| {
                tail.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();
        dispatcher.register_listener(&listener).unwrap();

        let err = dispatcher.publish(Counter(0)).unwrap_err();
        let execution = err.as_execution().unwrap();
        assert_eq!(execution.handler().handler(), "first");
        assert_eq!(execution.handler().listener(), "failing");
        assert_eq!(execution.suppressed(), 1);
        assert_eq!(execution.cause().to_string(), "first failure");
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_async_publish_inline() {
        let dispatcher = EventDispatcher::inline();
        let listener = ClosureListener::builder("adder")
            .on("add", |c: &mut Counter| {
                c.0 += 10;
                Ok(())
            })
            .build();
        dispatcher.register_listener(&listener).unwrap();

        let mut handle = dispatcher.publish_async(Counter(1));
        assert_eq!(handle.try_take().unwrap().unwrap().0, 11);
    }
}
