//! Cancellable task scopes enforcing structured completion.

mod concurrent;
mod config;
mod core;
mod handle;

pub use concurrent::{join_all, run_concurrently};
pub use config::{ErrorPolicy, ScopeConfig};
pub use self::core::{ChildReport, ChildStatus, Scope, ScopeBuilder};
pub use handle::{Outcome, TaskHandle};
