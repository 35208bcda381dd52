//! Event Types - 이벤트 기본 계약
//!
//! An event is identified by its concrete Rust type. Producers define their
//! own payload structs and mark them with [`Event`]:
//!
//! ```rust
//! use switchboard_event::{Event, EventType};
//!
//! struct UserJoined {
//!     user: String,
//! }
//!
//! impl Event for UserJoined {}
//!
//! assert_eq!(EventType::of::<UserJoined>(), EventType::of::<UserJoined>());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Base contract for every dispatchable event.
///
/// Handlers bind to exactly one concrete event type; there is no supertype
/// matching. Events must be `Send` so they can be published asynchronously.
pub trait Event: Any + Send {
    /// 로그용 이벤트 이름
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// EventType
// ============================================================================

/// Runtime type tag of an [`Event`]; the key of the handler table.
///
/// Equality and hashing only consider the `TypeId`; the name is carried for
/// logs and error messages.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// 이벤트 타입 태그 생성
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    impl Event for Ping {}

    struct Pong;
    impl Event for Pong {}

    #[test]
    fn test_event_type_identity() {
        assert_eq!(EventType::of::<Ping>(), EventType::of::<Ping>());
        assert_ne!(EventType::of::<Ping>(), EventType::of::<Pong>());
        assert!(EventType::of::<Ping>().name().ends_with("Ping"));
    }

    #[test]
    fn test_default_event_name() {
        assert!(Pong.event_name().ends_with("Pong"));
    }
}
