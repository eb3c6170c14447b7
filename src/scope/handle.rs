//! Handles to submitted tasks and their terminal outcomes.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::TaskError;

/// Terminal outcome of a task.
///
/// Set exactly once; once a task is `Completed`/`Failed`/`Canceled` the
/// state is immutable.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The body returned a value.
    Completed(T),
    /// The body returned a failure (terminal for this task).
    Failed(TaskError),
    /// The task observed cancellation, or was submitted to an
    /// already-cancelled scope and never ran.
    Canceled,
}

impl<T> Outcome<T> {
    /// Converts the outcome into a `Result`, mapping `Canceled` to
    /// [`TaskError::Canceled`].
    pub fn into_result(self) -> Result<T, TaskError> {
        match self {
            Outcome::Completed(v) => Ok(v),
            Outcome::Failed(e) => Err(e),
            Outcome::Canceled => Err(TaskError::Canceled),
        }
    }

    /// Returns `true` if the task completed with a value.
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }
}

/// Future-like handle to a task submitted to a scope.
///
/// The handle observes the task's terminal outcome; it does not own the
/// task — the scope does. Dropping a handle detaches nothing: the task
/// keeps running under its scope.
///
/// Awaiting an already-resolved handle returns immediately.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: Arc<str>,
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(name: Arc<str>, rx: oneshot::Receiver<Outcome<T>>) -> Self {
        Self { name, rx }
    }

    /// The task name given at submission.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Suspends until the task reaches a terminal state.
    ///
    /// A panicking body is caught by the scope and resolves here as
    /// [`Outcome::Failed`]. A dropped outcome channel reads as `Canceled`.
    pub async fn join(self) -> Outcome<T> {
        self.rx.await.unwrap_or(Outcome::Canceled)
    }

    /// Suspends until resolution and yields the value, raising the stored
    /// error for a failed task and [`TaskError::Canceled`] for a cancelled
    /// one.
    pub async fn value(self) -> Result<T, TaskError> {
        self.join().await.into_result()
    }
}
