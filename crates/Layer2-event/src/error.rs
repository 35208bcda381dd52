//! Error types for the dispatch core
//!
//! - [`EventError`]: everything `register_listener` / `publish` / the engine can report
//! - [`EventExecutionError`]: first handler failure of one publish
//! - [`SignatureViolation`]: which handler-signature rule a declaration broke

use crate::listener::ListenerId;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, EventError>;

/// Dispatch core error type
#[derive(Error, Debug)]
pub enum EventError {
    /// A listener declared a malformed handler. Nothing from that
    /// `register_listener` call was registered.
    #[error("invalid handler signature: {listener}::{handler}: {violation}")]
    InvalidHandlerSignature {
        listener: String,
        handler: String,
        violation: SignatureViolation,
    },

    /// A listener declared two handlers with the same name for one event
    /// type. Nothing from that `register_listener` call was registered.
    #[error("duplicate handler: {listener}::{handler} is declared twice for {event}")]
    DuplicateHandler {
        listener: String,
        handler: String,
        event: &'static str,
    },

    /// At least one handler failed during a publish.
    #[error(transparent)]
    EventExecution(#[from] EventExecutionError),

    /// The execution engine no longer accepts work.
    #[error("execution engine is shut down")]
    EngineShutdown,

    #[error("failed to start execution engine: {0}")]
    EngineStart(#[source] std::io::Error),
}

impl EventError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::InvalidHandlerSignature { .. } => "invalid_handler_signature",
            EventError::DuplicateHandler { .. } => "duplicate_handler",
            EventError::EventExecution(_) => "event_execution",
            EventError::EngineShutdown => "engine_shutdown",
            EventError::EngineStart(_) => "engine_start",
        }
    }

    /// Handler failure details, if this is an execution error.
    pub fn as_execution(&self) -> Option<&EventExecutionError> {
        match self {
            EventError::EventExecution(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// SignatureViolation
// ============================================================================

/// The constraint a handler declaration violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureViolation {
    #[error("expected exactly 1 parameter, found {found}")]
    ParameterCount { found: usize },

    #[error("parameter type {found} is not an event type")]
    ParameterType { found: String },

    #[error("expected no return value, found {found}")]
    ReturnType { found: String },
}

// ============================================================================
// HandlerId
// ============================================================================

/// Identity of one registered handler: (listener, handler name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId {
    listener: Arc<str>,
    listener_id: ListenerId,
    handler: Arc<str>,
}

impl HandlerId {
    pub(crate) fn new(listener: Arc<str>, listener_id: ListenerId, handler: Arc<str>) -> Self {
        Self {
            listener,
            listener_id,
            handler,
        }
    }

    /// 리스너 이름
    pub fn listener(&self) -> &str {
        &self.listener
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    /// 핸들러 이름
    pub fn handler(&self) -> &str {
        &self.handler
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.listener, self.handler)
    }
}

// ============================================================================
// EventExecutionError
// ============================================================================

/// First handler failure recorded during one publish.
///
/// The original cause is kept intact: errors a handler re-raised (for
/// example a collaborator's `AccessDenied`) can be recovered with
/// [`EventExecutionError::cause_as`].
#[derive(Debug)]
pub struct EventExecutionError {
    event: &'static str,
    handler: HandlerId,
    cause: anyhow::Error,
    suppressed: usize,
}

impl EventExecutionError {
    pub(crate) fn new(
        event: &'static str,
        handler: HandlerId,
        cause: anyhow::Error,
        suppressed: usize,
    ) -> Self {
        Self {
            event,
            handler,
            cause,
            suppressed,
        }
    }

    /// Type name of the event being dispatched.
    pub fn event(&self) -> &'static str {
        self.event
    }

    /// The handler that failed first.
    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Downcasts the original cause.
    pub fn cause_as<T>(&self) -> Option<&T>
    where
        T: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.cause.downcast_ref::<T>()
    }

    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }

    /// Number of handlers that failed after the first one in the same publish.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

impl fmt::Display for EventExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler {} failed on {}: {}", self.handler, self.event, self.cause)?;
        if self.suppressed > 0 {
            write!(f, " (+{} more failed)", self.suppressed)?;
        }
        Ok(())
    }
}

impl std::error::Error for EventExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = self.cause.as_ref();
        Some(cause)
    }
}

// ============================================================================
// HandlerPanicked
// ============================================================================

/// Cause recorded when a handler panics instead of returning an error.
#[derive(Error, Debug, Clone)]
#[error("handler panicked: {message}")]
pub struct HandlerPanicked {
    pub message: String,
}

impl HandlerPanicked {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_id() -> HandlerId {
        HandlerId::new(Arc::from("audit"), ListenerId::from_raw(7), Arc::from("on_join"))
    }

    #[test]
    fn test_execution_error_display() {
        let err = EventExecutionError::new("Join", handler_id(), anyhow::anyhow!("boom"), 2);
        assert_eq!(err.to_string(), "handler audit::on_join failed on Join: boom (+2 more failed)");
    }

    #[test]
    fn test_cause_downcast() {
        #[derive(Debug, Error)]
        #[error("custom")]
        struct Custom;

        let err = EventExecutionError::new("Join", handler_id(), Custom.into(), 0);
        assert!(err.cause_as::<Custom>().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_panic_payload_message() {
        let payload: Box<dyn Any + Send> = Box::new("kaboom");
        assert_eq!(HandlerPanicked::from_payload(payload).message, "kaboom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(HandlerPanicked::from_payload(payload).message, "owned");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(HandlerPanicked::from_payload(payload).message, "unknown panic payload");
    }

    #[test]
    fn test_labels() {
        assert_eq!(EventError::EngineShutdown.as_label(), "engine_shutdown");
        let violation = SignatureViolation::ParameterCount { found: 2 };
        assert_eq!(violation.to_string(), "expected exactly 1 parameter, found 2");
    }
}
