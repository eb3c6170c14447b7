//! # corral
//!
//! **Corral** is a structured-concurrency toolkit for Rust.
//!
//! It provides cancellable task scopes, rendezvous/bounded channels, and
//! cold demand-driven streams, with one rule underneath all of them: no
//! concurrent work outlives the construct that owns it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  task body   │   │  task body   │   │ nested Scope │
//!     │ (user fn #1) │   │ (user fn #2) │   │ (sub-tree)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scope (owning container)                                         │
//! │  - TaskContext (hierarchical cancellation tokens)                 │
//! │  - ErrorPolicy (fail-fast | isolate)                              │
//! │  - ExecContext (main: serialized / parallel: pool)                │
//! │  - Bus (broadcast lifecycle events) ──► observers                 │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ await_all(): suspends until every descendant is terminal
//!        ▼
//!   Vec<ChildReport> / first failure
//!
//!   Channel<T>  ── send ──► rendezvous / bounded / unbounded ── recv ──►
//!   (FIFO both for items and for blocked senders/receivers)
//!
//!   Flux<T>     ── collect(ctx, sink) ──► producer ──emit──► sink
//!   (cold: inert until collected, restarts per collection)
//! ```
//!
//! ### Cancellation
//! ```text
//! scope.cancel()
//!   ├─► cancels the scope's TaskContext
//!   │     ├─► every task's child context        (ctx.sleep / send / recv
//!   │     │                                      / emit return Canceled)
//!   │     └─► every nested scope, transitively
//!   ├─► tasks submitted afterwards never run (recorded Canceled)
//!   └─► await_all() still waits for all children to unwind
//!
//! Cancellation is cooperative: observed only at suspension points, and it
//! is never a failure — it does not trigger fail-fast and is reported as
//! its own terminal state.
//! ```
//!
//! ## Features
//! | Area          | Description                                                   | Key types                                 |
//! |---------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Scopes**    | Own, cancel, and drain groups of concurrent tasks.           | [`Scope`], [`TaskHandle`], [`Outcome`]    |
//! | **Policies**  | Decide what a child failure does to its siblings.            | [`ErrorPolicy`]                           |
//! | **Channels**  | FIFO hand-off between tasks; rendezvous, bounded, unbounded. | [`Channel`], [`ChannelIter`]              |
//! | **Streams**   | Cold, demand-driven value streams with lazy operators.       | [`Flux`], [`Emitter`], [`CollectOutcome`] |
//! | **Contexts**  | Where bodies run, and the cancellation they observe.         | [`ExecContext`], [`TaskContext`]          |
//! | **Events**    | Broadcast task/scope lifecycle events to observers.          | [`Event`], [`EventKind`], [`Observe`]     |
//! | **Errors**    | Typed failures with cancellation kept distinct.              | [`TaskError`], [`ChannelError`], [`FluxError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use corral::{Channel, ErrorPolicy, Scope, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), TaskError> {
//!     let scope = Scope::builder().policy(ErrorPolicy::FailFast).build();
//!
//!     // Producer and consumer meet at a rendezvous channel.
//!     let chan: Channel<u32> = Channel::rendezvous();
//!     let tx = chan.clone();
//!     scope.submit("squares", move |ctx| async move {
//!         for x in 1..=5u32 {
//!             tx.send(&ctx, x * x).await?;
//!         }
//!         tx.close();
//!         Ok(())
//!     });
//!
//!     let sum = scope.submit_with_result("sum", move |ctx| async move {
//!         let mut total = 0u32;
//!         while let Some(sq) = chan.recv(&ctx).await? {
//!             total += sq;
//!         }
//!         Ok::<_, TaskError>(total)
//!     });
//!
//!     assert_eq!(sum.value().await?, 55);
//!     scope.await_all().await?;
//!     Ok(())
//! }
//! ```

mod channel;
mod context;
mod error;
mod events;
mod flux;
mod observers;
mod scope;

// ---- Public re-exports ----

pub use channel::{Channel, ChannelIter};
pub use context::{ContextKind, ExecContext, TaskContext};
pub use error::{ChannelError, CollectOutcome, FluxError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use flux::{Emitter, Flux};
pub use observers::Observe;
pub use scope::{
    join_all, run_concurrently, ChildReport, ChildStatus, ErrorPolicy, Outcome, Scope,
    ScopeBuilder, ScopeConfig, TaskHandle,
};

// Optional: expose a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
