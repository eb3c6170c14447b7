//! Cold, demand-driven value streams.
//!
//! A [`Flux`] is a *description* of production: nothing runs until a
//! collector asks for values, and each collection restarts production from
//! the beginning. Producer and collector are connected by a rendezvous
//! hand-off, so the producer can never run ahead of demand.
//!
//! ```text
//!   Flux::new(|emitter| …)          description (cold, inert)
//!        │ transform / filter       lazy; wraps the emitter
//!        ▼
//!   collect(ctx, sink)              starts production
//!        │
//!   producer ──emit──► rendezvous ──recv──► sink(value)
//!        │                                      │
//!        └── error / end ──────────► surfaced after delivered values
//! ```

mod collect;
mod core;

pub use self::core::{Emitter, Flux};
