//! Execution Engine - 비동기 발행 실행기
//!
//! - [`BlockingPool`]: tokio 블로킹 풀 기반 (스레드 온디맨드 생성, 유휴 재사용)
//! - [`InlineEngine`]: 제출 스레드에서 즉시 실행 (테스트용)

use crate::error::{EventError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use switchboard_foundation::EngineConfig;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

/// A unit of work submitted to an engine.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs asynchronous publishes off the caller's thread.
pub trait ExecutionEngine: Send + Sync {
    /// Schedules `job`. Never blocks on the job itself.
    ///
    /// Fails with [`EventError::EngineShutdown`] once the engine has been shut
    /// down; the job is dropped in that case.
    fn submit(&self, job: Job) -> Result<()>;

    /// Stops accepting work. Idempotent.
    fn shutdown(&self);

    fn is_shutdown(&self) -> bool;

    /// 로그용 엔진 이름
    fn name(&self) -> &'static str {
        "engine"
    }
}

// ============================================================================
// BlockingPool
// ============================================================================

enum PoolState {
    Owned(Runtime),
    Borrowed(Handle),
    Stopped,
}

/// Worker pool backed by the blocking thread pool of a tokio runtime.
///
/// Threads are spawned on demand, reused while idle for the configured
/// keep-alive, and capped only by `max_workers`. There is no queue-depth
/// limit.
pub struct BlockingPool {
    state: RwLock<PoolState>,
    grace: Duration,
}

impl BlockingPool {
    /// Starts a pool that owns its own runtime.
    pub fn start(config: &EngineConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.max_workers_clamped())
            .thread_keep_alive(config.keep_alive())
            .thread_name(config.thread_name.clone())
            .build()
            .map_err(EventError::EngineStart)?;

        info!(
            thread_name = %config.thread_name,
            max_workers = config.max_workers_clamped(),
            keep_alive_ms = config.keep_alive_ms,
            "Execution engine started"
        );

        Ok(Self {
            state: RwLock::new(PoolState::Owned(runtime)),
            grace: config.shutdown_grace(),
        })
    }

    /// Runs jobs on an existing runtime. [`shutdown`](ExecutionEngine::shutdown)
    /// only detaches from it.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            state: RwLock::new(PoolState::Borrowed(handle)),
            grace: Duration::ZERO,
        }
    }
}

impl ExecutionEngine for BlockingPool {
    fn submit(&self, job: Job) -> Result<()> {
        let state = self.state.read();
        let handle = match &*state {
            PoolState::Owned(runtime) => runtime.handle(),
            PoolState::Borrowed(handle) => handle,
            PoolState::Stopped => return Err(EventError::EngineShutdown),
        };

        // JoinHandle is dropped: the job reports through its own channel
        handle.spawn_blocking(job);
        Ok(())
    }

    fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.state.write(), PoolState::Stopped);

        match previous {
            PoolState::Owned(runtime) => {
                // Dropping or blocking on a runtime from async context panics
                if Handle::try_current().is_ok() {
                    runtime.shutdown_background();
                } else {
                    runtime.shutdown_timeout(self.grace);
                }
                info!("Execution engine stopped");
            }
            PoolState::Borrowed(_) => debug!("Execution engine detached from runtime"),
            PoolState::Stopped => {}
        }
    }

    fn is_shutdown(&self) -> bool {
        matches!(*self.state.read(), PoolState::Stopped)
    }

    fn name(&self) -> &'static str {
        "blocking-pool"
    }
}

impl Drop for BlockingPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for BlockingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.read() {
            PoolState::Owned(_) => "owned",
            PoolState::Borrowed(_) => "borrowed",
            PoolState::Stopped => "stopped",
        };
        f.debug_struct("BlockingPool")
            .field("state", &state)
            .field("grace", &self.grace)
            .finish()
    }
}

// ============================================================================
// InlineEngine
// ============================================================================

/// Runs every job on the submitting thread before `submit` returns.
#[derive(Debug, Default)]
pub struct InlineEngine {
    stopped: AtomicBool,
}

impl InlineEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionEngine for InlineEngine {
    fn submit(&self, job: Job) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(EventError::EngineShutdown);
        }
        job();
        Ok(())
    }

    fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn is_shutdown(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;

    fn small_config() -> EngineConfig {
        EngineConfig {
            thread_name: "engine-test".to_string(),
            max_workers: 4,
            keep_alive_ms: 100,
            shutdown_grace_ms: 1000,
        }
    }

    #[test]
    fn test_inline_runs_immediately() {
        let engine = InlineEngine::new();
        let flag = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&flag);

        engine
            .submit(Box::new(move || seen.store(true, Ordering::SeqCst)))
            .unwrap();
        assert!(flag.load(Ordering::SeqCst));

        engine.shutdown();
        assert!(engine.is_shutdown());
        assert!(matches!(
            engine.submit(Box::new(|| {})),
            Err(EventError::EngineShutdown)
        ));
    }

    #[test]
    fn test_blocking_pool_runs_off_thread() {
        let pool = BlockingPool::start(&small_config()).unwrap();
        let (tx, rx) = mpsc::channel();
        let caller = std::thread::current().id();

        pool.submit(Box::new(move || {
            let name = std::thread::current().name().map(str::to_string);
            let _ = tx.send((std::thread::current().id(), name));
        }))
        .unwrap();

        let (worker, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(worker, caller);
        assert_eq!(name.as_deref(), Some("engine-test"));
    }

    #[test]
    fn test_blocking_pool_rejects_after_shutdown() {
        let pool = BlockingPool::start(&small_config()).unwrap();
        pool.shutdown();
        pool.shutdown();

        assert!(pool.is_shutdown());
        assert!(matches!(
            pool.submit(Box::new(|| {})),
            Err(EventError::EngineShutdown)
        ));
    }

    #[tokio::test]
    async fn test_borrowed_pool_inside_runtime() {
        let pool = BlockingPool::from_handle(Handle::current());
        let (tx, rx) = tokio::sync::oneshot::channel();

        pool.submit(Box::new(move || {
            let _ = tx.send(7);
        }))
        .unwrap();

        assert_eq!(rx.await.unwrap(), 7);
        pool.shutdown();
        assert!(pool.is_shutdown());
    }
}
