//! FIFO hand-off channels with back-pressure and fair rendezvous.

mod core;
mod iter;
mod state;

pub use self::core::Channel;
pub use iter::ChannelIter;
