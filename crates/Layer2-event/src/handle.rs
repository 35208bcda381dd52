//! Dispatch Handle - 비동기 발행 결과

use crate::error::{EventError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Pending outcome of [`EventDispatcher::publish_async`](crate::EventDispatcher::publish_async).
///
/// Resolves to the (possibly mutated) event, or to the error `publish` would
/// have returned. If the engine drops the job without running it the handle
/// resolves to [`EventError::EngineShutdown`].
///
/// Dropping the handle does not cancel the dispatch.
#[must_use = "dropping a DispatchHandle discards the publish outcome"]
#[derive(Debug)]
pub struct DispatchHandle<E> {
    rx: oneshot::Receiver<Result<E>>,
}

impl<E> DispatchHandle<E> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<E>>) -> Self {
        Self { rx }
    }

    /// Blocks the current thread until the dispatch completes.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the handle there instead.
    pub fn wait(self) -> Result<E> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(EventError::EngineShutdown))
    }

    /// Takes the outcome if the dispatch already completed.
    pub fn try_take(&mut self) -> Option<Result<E>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(EventError::EngineShutdown)),
        }
    }
}

impl<E> Future for DispatchHandle<E> {
    type Output = Result<E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(EventError::EngineShutdown)))
    }
}
