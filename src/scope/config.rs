//! Scope configuration.
//!
//! [`ScopeConfig`] centralizes the settings a [`Scope`](crate::Scope) is
//! built with. It is consumed either directly via
//! [`Scope::new`](crate::Scope::new) or through
//! [`Scope::builder`](crate::Scope::builder).

use crate::context::ExecContext;

/// Sibling-failure propagation policy of a scope.
///
/// Decides what happens to the *other* children when one child fails.
/// Cancellation is never a failure under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The first child failure cancels all remaining siblings, and
    /// `await_all` raises that failure once every sibling has unwound.
    #[default]
    FailFast,
    /// Child failures are collected independently; siblings keep running
    /// and `await_all` returns every child's terminal outcome.
    Isolate,
}

/// Configuration for a scope.
///
/// ## Field semantics
/// - `policy`: what a child failure does to its siblings.
/// - `context`: where task bodies run ([`ExecContext::main`] serializes,
///   [`ExecContext::parallel`] does not).
/// - `bus_capacity`: ring-buffer size of the lifecycle event bus (min 1,
///   clamped by the bus).
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Sibling-failure propagation policy.
    pub policy: ErrorPolicy,
    /// Execution context for task bodies.
    pub context: ExecContext,
    /// Capacity of the lifecycle event bus.
    pub bus_capacity: usize,
}

impl Default for ScopeConfig {
    /// Defaults: `FailFast`, parallel context, bus capacity 256.
    fn default() -> Self {
        Self {
            policy: ErrorPolicy::default(),
            context: ExecContext::parallel(),
            bus_capacity: 256,
        }
    }
}
