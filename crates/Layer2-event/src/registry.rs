//! Listener Registry - 핸들러 발견 및 레지스트리 테이블
//!
//! [`discover`] turns a listener's declarations into validated handlers.
//! [`HandlerTable`] stores them per event type, ordered by priority.
//!
//! The table is copy-on-write: readers load the current snapshot without
//! locking; writers are serialised and swap in a replacement map. A publish
//! that loaded a snapshot keeps using it even if a writer replaces it.

use crate::error::{EventError, HandlerId, Result, SignatureViolation};
use crate::event::EventType;
use crate::listener::{
    HandlerDeclaration, HandlerFn, Handlers, Listener, ListenerId, ParamType, Priority, ReturnType,
};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::any::Any;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Shared reference to a registered listener, type-erased.
pub(crate) type ListenerRef = Arc<dyn Any + Send + Sync>;

// ============================================================================
// Discovery
// ============================================================================

/// A validated handler ready to be inserted into the table.
#[derive(Clone)]
pub struct DiscoveredHandler {
    id: HandlerId,
    event_type: EventType,
    priority: Priority,
    callback: HandlerFn,
    listener: ListenerRef,
}

impl DiscoveredHandler {
    pub fn id(&self) -> &HandlerId {
        &self.id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl std::fmt::Debug for DiscoveredHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredHandler")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Collects and validates every handler `listener` declares.
///
/// Fails on the first malformed declaration, or on a handler name declared
/// twice for the same event type; in that case nothing is returned so the
/// caller can register all or nothing.
///
/// Every discovered handler holds a reference to `listener`, so the listener
/// stays alive (and its identity stays unique) while it is registered.
pub fn discover<L: Listener>(listener: &Arc<L>) -> Result<Vec<DiscoveredHandler>> {
    let mut handlers = Handlers::new(Arc::clone(listener));
    listener.declare(&mut handlers);

    let listener_name: Arc<str> = Arc::from(listener.name());
    let listener_id = ListenerId::of(listener);
    let listener_ref: ListenerRef = Arc::clone(listener) as ListenerRef;
    let mut seen: HashSet<(EventType, Cow<'static, str>)> = HashSet::new();

    handlers
        .into_declarations()
        .into_iter()
        .map(|declaration| -> Result<DiscoveredHandler> {
            let event_type =
                validate(&declaration).map_err(|violation| EventError::InvalidHandlerSignature {
                    listener: listener_name.to_string(),
                    handler: declaration.name.to_string(),
                    violation,
                })?;

            if !seen.insert((event_type, declaration.name.clone())) {
                return Err(EventError::DuplicateHandler {
                    listener: listener_name.to_string(),
                    handler: declaration.name.to_string(),
                    event: event_type.name(),
                });
            }

            Ok(DiscoveredHandler {
                id: HandlerId::new(
                    Arc::clone(&listener_name),
                    listener_id,
                    Arc::from(declaration.name.as_ref()),
                ),
                event_type,
                priority: declaration.priority,
                callback: declaration.callback,
                listener: Arc::clone(&listener_ref),
            })
        })
        .collect()
}

/// Checks parameter count, then parameter type, then return type.
fn validate(declaration: &HandlerDeclaration) -> std::result::Result<EventType, SignatureViolation> {
    let signature = &declaration.signature;

    let event_type = match signature.params.as_slice() {
        [ParamType::Event(event_type)] => *event_type,
        [other] => {
            return Err(SignatureViolation::ParameterType {
                found: other.name().to_string(),
            })
        }
        params => {
            return Err(SignatureViolation::ParameterCount {
                found: params.len(),
            })
        }
    };

    match signature.returns {
        ReturnType::Unit => Ok(event_type),
        ReturnType::Value(found) => Err(SignatureViolation::ReturnType {
            found: found.to_string(),
        }),
    }
}

// ============================================================================
// Registration
// ============================================================================

/// One entry of the table: a handler bound to its listener.
///
/// Holding `listener` keeps the allocation alive until the entry is removed,
/// so no other listener can be allocated at the same address meanwhile.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) handler: HandlerId,
    pub(crate) priority: Priority,
    pub(crate) callback: HandlerFn,
    listener: ListenerRef,
}

impl Registration {
    pub(crate) fn listener_id(&self) -> ListenerId {
        ListenerId::of(&self.listener)
    }

    fn matches(&self, listener_id: ListenerId, handler: &str) -> bool {
        self.listener_id() == listener_id && self.handler.handler() == handler
    }
}

// ============================================================================
// HandlerTable
// ============================================================================

type Snapshot = HashMap<EventType, Arc<[Registration]>>;

/// Event type → handlers in dispatch order.
pub(crate) struct HandlerTable {
    current: ArcSwap<Snapshot>,
    write_lock: Mutex<()>,
}

impl HandlerTable {
    pub(crate) fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Handlers for `event_type` as of now. The returned slice is immutable.
    pub(crate) fn handlers(&self, event_type: &EventType) -> Option<Arc<[Registration]>> {
        self.current.load().get(event_type).cloned()
    }

    /// Inserts the handlers that are not registered yet.
    ///
    /// Each lands after every existing handler with a lower or equal
    /// priority. Returns how many were inserted.
    pub(crate) fn insert(&self, discovered: Vec<DiscoveredHandler>) -> usize {
        let _guard = self.write_lock.lock();
        let current = self.current.load_full();

        let mut touched: HashMap<EventType, Vec<Registration>> = HashMap::new();
        let mut inserted = 0;

        for handler in discovered {
            let list = touched.entry(handler.event_type).or_insert_with(|| {
                current
                    .get(&handler.event_type)
                    .map(|existing| existing.to_vec())
                    .unwrap_or_default()
            });

            let listener_id = handler.id.listener_id();
            if list
                .iter()
                .any(|registration| registration.matches(listener_id, handler.id.handler()))
            {
                continue;
            }

            let position = list
                .iter()
                .position(|registration| registration.priority > handler.priority)
                .unwrap_or(list.len());
            list.insert(
                position,
                Registration {
                    handler: handler.id,
                    priority: handler.priority,
                    callback: handler.callback,
                    listener: handler.listener,
                },
            );
            inserted += 1;
        }

        if inserted > 0 {
            let mut next: Snapshot = (*current).clone();
            for (event_type, list) in touched {
                next.insert(event_type, Arc::from(list));
            }
            self.current.store(Arc::new(next));
        }

        inserted
    }

    /// Removes every handler of `listener_id` across all event types.
    pub(crate) fn remove(&self, listener_id: ListenerId) -> usize {
        let _guard = self.write_lock.lock();
        let current = self.current.load_full();

        let mut next: Snapshot = HashMap::with_capacity(current.len());
        let mut removed = 0;

        for (event_type, list) in current.iter() {
            let before = list.len();
            let kept: Vec<Registration> = list
                .iter()
                .filter(|registration| registration.listener_id() != listener_id)
                .cloned()
                .collect();
            removed += before - kept.len();

            if kept.len() == before {
                next.insert(*event_type, Arc::clone(list));
            } else if !kept.is_empty() {
                next.insert(*event_type, Arc::from(kept));
            }
        }

        if removed > 0 {
            self.current.store(Arc::new(next));
        }

        removed
    }

    pub(crate) fn handler_count(&self, event_type: &EventType) -> usize {
        self.current.load().get(event_type).map_or(0, |list| list.len())
    }

    pub(crate) fn listener_count(&self) -> usize {
        let snapshot = self.current.load();
        snapshot
            .values()
            .flat_map(|list| list.iter().map(Registration::listener_id))
            .collect::<HashSet<_>>()
            .len()
    }

    pub(crate) fn contains(&self, listener_id: ListenerId) -> bool {
        self.current
            .load()
            .values()
            .any(|list| list.iter().any(|r| r.listener_id() == listener_id))
    }
}
