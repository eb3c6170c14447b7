//! Simple logging observer for debugging and demos.
//!
//! [`LogWriter`] forwards events through the [`log`] facade in a compact
//! human-readable format. Enabled via the `logging` feature; primarily
//! useful for development and examples — implement a custom
//! [`Observe`](crate::Observe) for structured logging or metrics.
//!
//! ## Output format
//! ```text
//! [starting] task=fetcher scope=3
//! [failed] task=fetcher scope=3 err="connection refused"
//! [canceled] task=ticker scope=3
//! [completed] task=fetcher scope=3
//! [scope-cancel-requested] scope=3
//! [scope-drained] scope=3
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Logging observer backed by the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("?");
        let scope = e.scope.unwrap_or(0);
        match e.kind {
            EventKind::TaskStarting => {
                log::debug!("[starting] task={task} scope={scope}");
            }
            EventKind::TaskCompleted => {
                log::debug!("[completed] task={task} scope={scope}");
            }
            EventKind::TaskFailed => {
                let reason = e.reason.as_deref().unwrap_or("unknown");
                log::warn!("[failed] task={task} scope={scope} err={reason:?}");
            }
            EventKind::TaskCanceled => {
                log::debug!("[canceled] task={task} scope={scope}");
            }
            EventKind::ScopeCancelRequested => {
                log::debug!("[scope-cancel-requested] scope={scope}");
            }
            EventKind::ScopeDrained => {
                log::debug!("[scope-drained] scope={scope}");
            }
        }
    }
}
