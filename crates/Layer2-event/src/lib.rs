//! # switchboard-event
//!
//! In-process typed publish/subscribe for Switchboard:
//! - Event: 이벤트 계약 (Event, EventType)
//! - Listener: 핸들러 선언 (Listener, Handlers, ClosureListener, Priority)
//! - Registry: 핸들러 발견/검증 및 우선순위 테이블 (discover)
//! - Dispatcher: 등록/해제, 동기/비동기 발행 (EventDispatcher)
//! - Engine: 비동기 발행 실행기 (ExecutionEngine, BlockingPool, InlineEngine)
//!
//! ## 보장
//!
//! - Handlers for one publish run strictly in priority, then registration,
//!   order. Lookup is by exact event type.
//! - A failing (or panicking) handler never stops its siblings; the first
//!   failure is reported after all handlers ran.
//! - Registration changes swap in a new table snapshot. A publish sees the
//!   handler set from before or after a concurrent change, never a mix.
//!
//! ## 사용 예시
//!
//! ```rust
//! use switchboard_event::{ClosureListener, Event, EventDispatcher, Priority};
//!
//! struct Greeting(String);
//! impl Event for Greeting {}
//!
//! let dispatcher = EventDispatcher::inline();
//! let listener = ClosureListener::builder("greeter")
//!     .on_with_priority("exclaim", Priority::LATE, |g: &mut Greeting| {
//!         g.0.push('!');
//!         Ok(())
//!     })
//!     .on("name", |g: &mut Greeting| {
//!         g.0.push_str(", world");
//!         Ok(())
//!     })
//!     .build();
//!
//! dispatcher.register_listener(&listener).unwrap();
//! let greeting = dispatcher.publish(Greeting("hello".into())).unwrap();
//! assert_eq!(greeting.0, "hello, world!");
//! ```

mod dispatcher;
mod engine;
mod error;
mod event;
mod handle;
mod listener;
mod registry;

// ============================================================================
// Core
// ============================================================================
pub use dispatcher::EventDispatcher;
pub use event::{Event, EventType};
pub use handle::DispatchHandle;

// ============================================================================
// Listener (리스너 선언)
// ============================================================================
pub use listener::{
    ClosureListener, ClosureListenerBuilder, HandlerDeclaration, HandlerFn, HandlerSignature,
    Handlers, Listener, ListenerId, ParamType, Priority, ReturnType,
};
pub use registry::{discover, DiscoveredHandler};

// ============================================================================
// Engine (실행기)
// ============================================================================
pub use engine::{BlockingPool, ExecutionEngine, InlineEngine, Job};

// ============================================================================
// Error
// ============================================================================
pub use error::{
    EventError, EventExecutionError, HandlerId, HandlerPanicked, Result, SignatureViolation,
};
