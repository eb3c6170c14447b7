//! Lifecycle events emitted by scopes and their tasks.
//!
//! [`EventKind`] classifies the observable lifecycle points:
//!
//! - **Task events**: a task starting, completing, failing, or being
//!   cancelled.
//! - **Scope events**: cancellation requested, all children drained.
//!
//! The [`Event`] struct carries metadata (timestamp, task name, reason).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are observed
//! out of order across observers.
//!
//! ## Example
//! ```rust
//! use corral::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("fetcher")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("fetcher"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A task body is about to run.
    ///
    /// Sets: `task`, `scope`, `at`, `seq`.
    TaskStarting,

    /// A task body returned successfully.
    ///
    /// Sets: `task`, `scope`, `at`, `seq`.
    TaskCompleted,

    /// A task body returned a failure (terminal for that task).
    ///
    /// Sets: `task`, `scope`, `reason` (error message), `at`, `seq`.
    TaskFailed,

    /// A task stopped at a suspension point due to cancellation, or was
    /// submitted to an already-cancelled scope and never ran.
    ///
    /// Sets: `task`, `scope`, `at`, `seq`.
    TaskCanceled,

    /// Cancellation of a scope (and all its children) was requested.
    ///
    /// Sets: `scope`, `at`, `seq`.
    ScopeCancelRequested,

    /// A scope finished draining: every child reached a terminal state.
    ///
    /// Sets: `scope`, `at`, `seq`.
    ScopeDrained,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Identifier of the owning scope, if applicable.
    pub scope: Option<u64>,
    /// Human-readable reason (error messages, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp
    /// and the next global sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            scope: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the owning scope identifier.
    #[inline]
    pub fn with_scope(mut self, scope: u64) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builder_sets_fields() {
        let ev = Event::new(EventKind::TaskFailed)
            .with_task("worker")
            .with_scope(7)
            .with_reason("boom");
        assert_eq!(ev.task.as_deref(), Some("worker"));
        assert_eq!(ev.scope, Some(7));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}
