//! Pull-style channel iteration.

use crate::channel::Channel;
use crate::context::TaskContext;
use crate::error::ChannelError;

/// Lazy sequence of channel items, ending at end-of-channel.
///
/// Produced by [`Channel::iter`]. Because a channel is single-pass, a new
/// iteration over the *same* channel continues where the previous one left
/// off; restarting a sequence requires a fresh channel.
#[derive(Debug)]
pub struct ChannelIter<T> {
    chan: Channel<T>,
}

impl<T: Send + 'static> ChannelIter<T> {
    pub(crate) fn new(chan: Channel<T>) -> Self {
        Self { chan }
    }

    /// Next item, or `Ok(None)` at end-of-channel.
    ///
    /// Suspension point: observes cancellation of `ctx` while blocked.
    pub async fn next(&mut self, ctx: &TaskContext) -> Result<Option<T>, ChannelError> {
        self.chan.recv(ctx).await
    }
}
