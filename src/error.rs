//! Error types used by scopes, channels, and streams.
//!
//! This module defines the failure taxonomy of the crate:
//!
//! - [`TaskError`] — terminal failures of individual task bodies.
//! - [`ChannelError`] — failures of channel send/receive operations.
//! - [`FluxError`] — failures surfaced to a stream collector.
//! - [`CollectOutcome`] — the (non-error) result of deadline-bounded collection.
//!
//! Cancellation is deliberately modelled as its own variant everywhere:
//! a cancelled task is *not* a failed task, and never triggers a
//! fail-fast cascade.
//!
//! All enums provide `as_label()` returning a short stable snake_case
//! label for logs/metrics.

use thiserror::Error;

/// # Errors produced by task execution.
///
/// A task body returns `Result<T, TaskError>`. `Failed` is terminal and may
/// cascade into sibling cancellation under
/// [`ErrorPolicy::FailFast`](crate::ErrorPolicy); `Canceled` is a graceful
/// stop and never cascades.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Unhandled failure raised inside a task body.
    #[error("task failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Task observed cancellation at a suspension point and stopped.
    #[error("task canceled")]
    Canceled,
}

impl TaskError {
    /// Convenience constructor for a [`TaskError::Failed`].
    ///
    /// # Example
    /// ```
    /// use corral::TaskError;
    ///
    /// let err = TaskError::failed("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn failed(error: impl Into<String>) -> Self {
        TaskError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Failed { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns `true` for [`TaskError::Canceled`].
    ///
    /// Cancellation is a signal, not a failure; callers use this to decide
    /// whether an error should count against a fail-fast policy.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

/// Lets task bodies forward channel errors with `?`. A cancelled channel
/// operation stays a cancellation; a closed channel is a failure.
impl From<ChannelError> for TaskError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Closed => TaskError::failed("channel closed"),
            ChannelError::Canceled => TaskError::Canceled,
        }
    }
}

/// # Errors produced by channel operations.
///
/// `recv` never returns `Closed`: a closed-and-drained channel yields
/// `Ok(None)` (end-of-channel), which is an ordinary terminal signal,
/// not an error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Send was attempted on a channel that is already closed.
    #[error("channel closed")]
    Closed,

    /// The operation was interrupted by cancellation while blocked.
    #[error("channel operation canceled")]
    Canceled,
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use corral::ChannelError;
    ///
    /// assert_eq!(ChannelError::Closed.as_label(), "channel_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Closed => "channel_closed",
            ChannelError::Canceled => "channel_canceled",
        }
    }
}

/// # Errors surfaced to a stream collector.
///
/// A production error is delivered *after* any values already handed to the
/// consumer; no further values follow it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FluxError {
    /// The generator or a transform stage raised an error mid-production.
    #[error("stream production failed: {error}")]
    Production {
        /// The underlying error message.
        error: String,
    },

    /// Collection was interrupted by cancellation of the consuming task.
    #[error("stream collection canceled")]
    Canceled,
}

impl FluxError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FluxError::Production { .. } => "flux_production",
            FluxError::Canceled => "flux_canceled",
        }
    }
}

/// Result of a deadline-bounded collection.
///
/// Returned (not raised) by
/// [`Flux::collect_with_timeout`](crate::Flux::collect_with_timeout):
/// hitting the deadline is an expected outcome, and values already delivered
/// to the consumer are retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// The stream ran to completion before the deadline.
    Completed,
    /// The deadline elapsed first; production was cancelled and joined.
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::failed("x").as_label(), "task_failed");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
        assert_eq!(ChannelError::Canceled.as_label(), "channel_canceled");
        assert_eq!(
            FluxError::Production { error: "x".into() }.as_label(),
            "flux_production"
        );
    }

    #[test]
    fn canceled_is_not_a_failure() {
        assert!(TaskError::Canceled.is_canceled());
        assert!(!TaskError::failed("boom").is_canceled());
    }

    #[test]
    fn display_carries_the_message() {
        let err = TaskError::failed("connection refused");
        assert_eq!(err.to_string(), "task failed: connection refused");
    }
}
