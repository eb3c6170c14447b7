//! Observer trait and built-in observers.

mod observer;

pub use observer::Observe;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use self::log::LogWriter;
