//! Observer seam for lifecycle events.
//!
//! A scope with attached observers spawns one fire-and-forget listener
//! that drains the scope's [`Bus`](crate::Bus) and hands each event to
//! every observer in turn. The core never depends on an observer's result:
//! a slow observer can lag the bus, but it can never block a task.

use async_trait::async_trait;

use crate::events::Event;

/// Hook into scope/task lifecycle events (logging, metrics, assertions).
///
/// Implementations must be cheap or internally buffered; `on_event` is
/// awaited by the shared listener task, so one stalled observer delays the
/// delivery (not the production) of events to the others.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use corral::{Event, EventKind, Observe};
///
/// struct FailureCounter(std::sync::atomic::AtomicUsize);
///
/// #[async_trait]
/// impl Observe for FailureCounter {
///     async fn on_event(&self, event: &Event) {
///         if event.kind == EventKind::TaskFailed {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Called once per observed event, in `seq` order per listener.
    async fn on_event(&self, event: &Event);
}
