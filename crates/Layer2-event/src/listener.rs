//! Listener - 핸들러 선언 계약
//!
//! A listener is any `Send + Sync` object that declares its handlers through
//! [`Listener::declare`]. Typed declarations ([`Handlers::on`]) are checked by
//! the compiler; bridged declarations ([`Handlers::bridged`]) describe their
//! signature at runtime and are validated when the listener is registered.

use crate::event::{Event, EventType};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Priority
// ============================================================================

/// Handler priority. Lower values run first; equal priorities keep
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    pub const FIRST: Priority = Priority(i32::MIN);
    pub const EARLY: Priority = Priority(-100);
    pub const NORMAL: Priority = Priority(0);
    pub const LATE: Priority = Priority(100);
    pub const LAST: Priority = Priority(i32::MAX);

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// 리스너 식별자: 등록에 사용된 `Arc` 할당 주소
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Identity of the allocation behind `listener`. Clones of the same `Arc`
    /// share one id.
    pub fn of<L: ?Sized>(listener: &Arc<L>) -> Self {
        Self(Arc::as_ptr(listener).cast::<()>() as usize)
    }

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{:x}", self.0)
    }
}

// ============================================================================
// Handler signature
// ============================================================================

/// Type-erased handler callback. Receives the event being dispatched.
pub type HandlerFn = Arc<dyn Fn(&mut dyn Any) -> anyhow::Result<()> + Send + Sync>;

/// One declared parameter of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Event(EventType),
    /// Anything that is not an event type, by name.
    Other(&'static str),
}

impl ParamType {
    pub fn event<E: Event>() -> Self {
        Self::Event(EventType::of::<E>())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Event(ty) => ty.name(),
            ParamType::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Unit,
    Value(&'static str),
}

/// Declared shape of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSignature {
    pub params: Vec<ParamType>,
    pub returns: ReturnType,
}

impl HandlerSignature {
    /// Well-formed signature of a handler for `E`.
    pub fn handler_of<E: Event>() -> Self {
        Self {
            params: vec![ParamType::event::<E>()],
            returns: ReturnType::Unit,
        }
    }

    pub fn new(params: Vec<ParamType>, returns: ReturnType) -> Self {
        Self { params, returns }
    }
}

// ============================================================================
// HandlerDeclaration
// ============================================================================

/// A handler as declared by a listener, before validation.
#[derive(Clone)]
pub struct HandlerDeclaration {
    pub(crate) name: Cow<'static, str>,
    pub(crate) priority: Priority,
    pub(crate) signature: HandlerSignature,
    pub(crate) callback: HandlerFn,
}

impl HandlerDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn signature(&self) -> &HandlerSignature {
        &self.signature
    }
}

impl fmt::Debug for HandlerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDeclaration")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

fn typed_callback<E, F>(f: F) -> HandlerFn
where
    E: Event,
    F: Fn(&mut E) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(move |event: &mut dyn Any| match event.downcast_mut::<E>() {
        Some(event) => f(event),
        None => Err(anyhow::anyhow!(
            "event type mismatch: expected {}",
            std::any::type_name::<E>()
        )),
    })
}

// ============================================================================
// Listener
// ============================================================================

/// Capability trait for objects that handle events.
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use switchboard_event::{Event, Handlers, Listener, Priority};
///
/// struct Joined;
/// impl Event for Joined {}
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl Listener for Counter {
///     fn declare(&self, handlers: &mut Handlers<Self>) {
///         handlers.on_with_priority("count", Priority::LATE, |me: &Self, _: &mut Joined| {
///             me.0.fetch_add(1, Ordering::SeqCst);
///             Ok(())
///         });
///     }
/// }
/// ```
pub trait Listener: Send + Sync + 'static {
    /// 디버깅/에러 메시지용 이름
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Declares every handler of this listener.
    fn declare(&self, handlers: &mut Handlers<Self>)
    where
        Self: Sized;
}

/// Collects the handler declarations of one listener.
pub struct Handlers<L> {
    listener: Arc<L>,
    declarations: Vec<HandlerDeclaration>,
}

impl<L: Listener> Handlers<L> {
    pub(crate) fn new(listener: Arc<L>) -> Self {
        Self {
            listener,
            declarations: Vec::new(),
        }
    }

    /// Declares a handler for `E` at [`Priority::NORMAL`].
    pub fn on<E, F>(&mut self, name: impl Into<Cow<'static, str>>, handler: F) -> &mut Self
    where
        E: Event,
        F: Fn(&L, &mut E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_with_priority(name, Priority::NORMAL, handler)
    }

    pub fn on_with_priority<E, F>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        priority: Priority,
        handler: F,
    ) -> &mut Self
    where
        E: Event,
        F: Fn(&L, &mut E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let listener = Arc::clone(&self.listener);
        self.push(HandlerDeclaration {
            name: name.into(),
            priority,
            signature: HandlerSignature::handler_of::<E>(),
            callback: typed_callback(move |event: &mut E| handler(&listener, event)),
        })
    }

    /// Declares a handler whose signature is only known at runtime (e.g. a
    /// scripted plugin). The signature is validated on registration.
    pub fn bridged<F>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        priority: Priority,
        signature: HandlerSignature,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(&L, &mut dyn Any) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let listener = Arc::clone(&self.listener);
        self.push(HandlerDeclaration {
            name: name.into(),
            priority,
            signature,
            callback: Arc::new(move |event: &mut dyn Any| handler(&listener, event)),
        })
    }

    pub(crate) fn push(&mut self, declaration: HandlerDeclaration) -> &mut Self {
        self.declarations.push(declaration);
        self
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub(crate) fn into_declarations(self) -> Vec<HandlerDeclaration> {
        self.declarations
    }
}

// ============================================================================
// ClosureListener
// ============================================================================

/// Listener assembled from plain closures.
///
/// ```rust
/// use switchboard_event::{ClosureListener, Event, EventDispatcher};
///
/// struct Ping(u32);
/// impl Event for Ping {}
///
/// let dispatcher = EventDispatcher::inline();
/// let listener = ClosureListener::builder("doubler")
///     .on("double", |ping: &mut Ping| {
///         ping.0 *= 2;
///         Ok(())
///     })
///     .build();
///
/// dispatcher.register_listener(&listener).unwrap();
/// assert_eq!(dispatcher.publish(Ping(21)).unwrap().0, 42);
/// ```
pub struct ClosureListener {
    name: String,
    declarations: Vec<HandlerDeclaration>,
}

impl ClosureListener {
    pub fn builder(name: impl Into<String>) -> ClosureListenerBuilder {
        ClosureListenerBuilder {
            name: name.into(),
            declarations: Vec::new(),
        }
    }
}

impl Listener for ClosureListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare(&self, handlers: &mut Handlers<Self>) {
        for declaration in &self.declarations {
            handlers.push(declaration.clone());
        }
    }
}

impl fmt::Debug for ClosureListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureListener")
            .field("name", &self.name)
            .field("handlers", &self.declarations.len())
            .finish()
    }
}

/// Builder for [`ClosureListener`]
pub struct ClosureListenerBuilder {
    name: String,
    declarations: Vec<HandlerDeclaration>,
}

impl ClosureListenerBuilder {
    pub fn on<E, F>(self, name: impl Into<Cow<'static, str>>, handler: F) -> Self
    where
        E: Event,
        F: Fn(&mut E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_with_priority(name, Priority::NORMAL, handler)
    }

    pub fn on_with_priority<E, F>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        priority: Priority,
        handler: F,
    ) -> Self
    where
        E: Event,
        F: Fn(&mut E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.declarations.push(HandlerDeclaration {
            name: name.into(),
            priority,
            signature: HandlerSignature::handler_of::<E>(),
            callback: typed_callback(handler),
        });
        self
    }

    pub fn bridged<F>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        priority: Priority,
        signature: HandlerSignature,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut dyn Any) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.declarations.push(HandlerDeclaration {
            name: name.into(),
            priority,
            signature,
            callback: Arc::new(handler),
        });
        self
    }

    pub fn build(self) -> Arc<ClosureListener> {
        Arc::new(ClosureListener {
            name: self.name,
            declarations: self.declarations,
        })
    }
}
