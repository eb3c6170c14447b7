//! Execution contexts and the per-task cancellation context.
//!
//! Two kinds of context live here:
//!
//! - [`ExecContext`] — a *named* execution context that decides where task
//!   bodies run. Contexts are resolved at construction time and passed
//!   explicitly; there is no ambient/global lookup.
//! - [`TaskContext`] — handed to every task body. It carries the
//!   cancellation token and exposes the suspension points
//!   ([`TaskContext::sleep`], channel send/receive, emitter emit) at which
//!   cancellation is observed.
//!
//! ## Cancellation model
//! Cancellation is a signal, not an interrupt. A task only observes it at
//! suspension points; a body that never suspends cannot be cancelled
//! mid-run. This is a deliberate limitation of the cooperative model —
//! long compute loops should call [`TaskContext::checkpoint`] periodically.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Classification of execution contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Single-lane context: tasks run one at a time, in submission order.
    /// Serializes externally visible side effects.
    Main,
    /// Multi-threaded pool: tasks may run concurrently. The number of
    /// underlying worker threads is a runtime concern; the only guarantee
    /// is "more than one, safe for concurrent execution".
    Parallel,
}

/// A named execution context, resolved at construction time.
///
/// `ExecContext` decides *where* a task body runs, never *what* it
/// computes. A `main()` context owns a single-permit semaphore and admits
/// one body at a time; a `parallel()` context spawns straight onto the
/// runtime's pool.
///
/// Contexts are cheap to clone and are passed by value at every call site
/// that spawns work — no operation runs without an explicit context.
///
/// # Example
/// ```
/// use corral::{ContextKind, ExecContext};
///
/// let main = ExecContext::main();
/// assert_eq!(main.kind(), ContextKind::Main);
///
/// let pool = ExecContext::parallel();
/// assert_eq!(pool.kind(), ContextKind::Parallel);
/// ```
#[derive(Debug, Clone)]
pub struct ExecContext {
    kind: ContextKind,
    /// Present only for `Main`: a one-permit gate serializing bodies.
    gate: Option<Arc<Semaphore>>,
}

impl ExecContext {
    /// Creates a serialized context: at most one task body runs at a time.
    pub fn main() -> Self {
        Self {
            kind: ContextKind::Main,
            gate: Some(Arc::new(Semaphore::new(1))),
        }
    }

    /// Creates a multi-threaded pool context with no concurrency cap.
    pub fn parallel() -> Self {
        Self {
            kind: ContextKind::Parallel,
            gate: None,
        }
    }

    /// Returns the context classification.
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Spawns `fut` onto this context.
    ///
    /// For a `Main` context the future first acquires the serialization
    /// permit; acquisition order is FIFO, so bodies start in submission
    /// order.
    pub(crate) fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match &self.gate {
            Some(gate) => {
                let gate = Arc::clone(gate);
                tokio::spawn(async move {
                    // The semaphore is never closed; an Err here would mean
                    // the gate vanished, in which case running ungated is
                    // still sound.
                    let _permit = gate.clone().acquire_owned().await.ok();
                    fut.await
                })
            }
            None => tokio::spawn(fut),
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::parallel()
    }
}

/// Per-task cancellation context.
///
/// Every task body receives a `TaskContext`. It wraps a
/// [`CancellationToken`] arranged hierarchically: cancelling a scope
/// cancels the contexts of all its tasks, transitively through nested
/// scopes.
///
/// # Example
/// ```
/// # use std::time::Duration;
/// # use corral::{TaskContext, TaskError};
/// # async fn body(ctx: TaskContext) -> Result<(), TaskError> {
/// loop {
///     ctx.sleep(Duration::from_millis(100)).await?; // suspension point
///     // do one unit of work...
/// #   break;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TaskContext {
    token: CancellationToken,
}

impl TaskContext {
    /// Creates a root context with no parent.
    pub fn root() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Derives a child context; cancelling `self` cancels the child,
    /// cancelling the child does not affect `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Requests cancellation of this context and all contexts derived
    /// from it. Idempotent and irreversible.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when cancellation is requested. Useful in `select!` arms.
    pub async fn canceled(&self) {
        self.token.cancelled().await;
    }

    /// Suspends for `duration`, observing cancellation.
    ///
    /// This is the canonical suspension point: returns `Err(Canceled)` if
    /// cancellation is requested before the sleep elapses.
    pub async fn sleep(&self, duration: Duration) -> Result<(), TaskError> {
        if self.is_canceled() {
            return Err(TaskError::Canceled);
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.token.cancelled() => Err(TaskError::Canceled),
        }
    }

    /// Cheap explicit cancellation check for compute-heavy loops that do
    /// not otherwise suspend.
    pub fn checkpoint(&self) -> Result<(), TaskError> {
        if self.is_canceled() {
            Err(TaskError::Canceled)
        } else {
            Ok(())
        }
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::root()
    }
}
