//! Channel handle and the send/receive/close operations.
//!
//! A [`Channel`] is a FIFO hand-off between producer and consumer tasks.
//! Items are delivered to exactly one receiver each, in send order; waiting
//! receivers are served in arrival order (the fairness guarantee behind the
//! ping/pong rendezvous pattern).
//!
//! ## Capacity
//! - [`Channel::rendezvous`] — zero buffer; a send suspends until a
//!   receiver takes the item (synchronous hand-off).
//! - [`Channel::bounded`] — buffer up to `n`; senders suspend only when the
//!   buffer is full (back-pressure).
//! - [`Channel::unbounded`] — unlimited buffer; senders never suspend.
//!
//! ## Close semantics
//! `close()` is idempotent. Parked senders wake with
//! [`ChannelError::Closed`]; buffered items remain receivable, after which
//! `recv` yields `Ok(None)` — end-of-channel is a terminal signal, not an
//! error.
//!
//! ## Cancellation
//! Send and receive are suspension points: both take a
//! [`TaskContext`] and resolve to [`ChannelError::Canceled`] if the context
//! is cancelled while they are blocked.
//!
//! ## Example
//! ```
//! use corral::{Channel, ErrorPolicy, Scope, TaskContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scope = Scope::builder().policy(ErrorPolicy::FailFast).build();
//! let chan = Channel::rendezvous();
//!
//! let tx = chan.clone();
//! scope.submit("producer", move |ctx| async move {
//!     for x in 1..=5 {
//!         tx.send(&ctx, x * x).await?;
//!     }
//!     tx.close();
//!     Ok(())
//! });
//!
//! let ctx = TaskContext::root();
//! let mut squares = Vec::new();
//! while let Some(v) = chan.recv(&ctx).await.expect("recv") {
//!     squares.push(v);
//! }
//! assert_eq!(squares, vec![1, 4, 9, 16, 25]);
//! scope.await_all().await.expect("scope");
//! # }
//! ```

use std::sync::Arc;

use crate::channel::iter::ChannelIter;
use crate::channel::state::{Capacity, RecvFuture, SendFuture, Shared};
use crate::context::TaskContext;
use crate::error::ChannelError;

/// Cloneable handle to a FIFO hand-off channel.
///
/// All clones refer to the same channel; the channel itself is dropped when
/// the last handle goes away.
#[derive(Debug)]
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> Channel<T> {
    /// Creates a zero-buffer channel: every send is a rendezvous.
    pub fn rendezvous() -> Self {
        Self::with_capacity(Capacity::Rendezvous)
    }

    /// Creates a channel buffering up to `capacity` items.
    ///
    /// `capacity == 0` is the rendezvous case.
    pub fn bounded(capacity: usize) -> Self {
        if capacity == 0 {
            Self::rendezvous()
        } else {
            Self::with_capacity(Capacity::Bounded(capacity))
        }
    }

    /// Creates a channel with an unlimited buffer.
    pub fn unbounded() -> Self {
        Self::with_capacity(Capacity::Unbounded)
    }

    fn with_capacity(capacity: Capacity) -> Self {
        Self {
            shared: Arc::new(Shared::new(capacity)),
        }
    }

    /// Sends `item`, suspending under back-pressure.
    ///
    /// Suspension point: returns `Err(Canceled)` if `ctx` is cancelled
    /// while blocked, `Err(Closed)` if the channel is (or becomes) closed
    /// before delivery.
    pub async fn send(&self, ctx: &TaskContext, item: T) -> Result<(), ChannelError> {
        if ctx.is_canceled() {
            return Err(ChannelError::Canceled);
        }
        let fut = SendFuture::new(Arc::clone(&self.shared), item);
        tokio::select! {
            biased;
            res = fut => res,
            _ = ctx.canceled() => Err(ChannelError::Canceled),
        }
    }

    /// Receives the next item in FIFO order.
    ///
    /// - `Ok(Some(item))` — delivered exactly once to this receiver.
    /// - `Ok(None)` — channel closed and drained (end-of-channel).
    /// - `Err(Canceled)` — `ctx` cancelled while blocked.
    pub async fn recv(&self, ctx: &TaskContext) -> Result<Option<T>, ChannelError> {
        if ctx.is_canceled() {
            return Err(ChannelError::Canceled);
        }
        let fut = RecvFuture::new(Arc::clone(&self.shared));
        tokio::select! {
            biased;
            res = fut => res,
            _ = ctx.canceled() => Err(ChannelError::Canceled),
        }
    }

    /// Closes the channel. Idempotent.
    ///
    /// Parked senders wake with [`ChannelError::Closed`]; buffered items
    /// remain receivable before end-of-channel.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Returns `true` once the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Number of currently buffered (sent but unreceived) items.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` if no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pull-style iteration until end-of-channel.
    ///
    /// A channel instance is single-pass: iteration consumes items for
    /// good; restart requires a fresh channel.
    pub fn iter(&self) -> ChannelIter<T> {
        ChannelIter::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskError;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn fifo_order_and_end_of_channel() {
        let ctx = TaskContext::root();
        let chan = Channel::unbounded();

        for x in 1..=5 {
            chan.send(&ctx, x).await.expect("send");
        }
        chan.close();

        let mut got = Vec::new();
        let mut iter = chan.iter();
        while let Some(v) = iter.next(&ctx).await.expect("recv") {
            got.push(v);
        }
        assert_eq!(got, vec![1, 2, 3, 4, 5]);
        // End-of-channel is sticky.
        assert_eq!(chan.recv(&ctx).await, Ok(None));
    }

    #[tokio::test]
    async fn rendezvous_hands_off_to_a_waiting_receiver() {
        let ctx = TaskContext::root();
        let chan = Channel::rendezvous();

        let rx = chan.clone();
        let rx_ctx = ctx.clone();
        let receiver = tokio::spawn(async move { rx.recv(&rx_ctx).await });

        chan.send(&ctx, 42).await.expect("send");
        assert_eq!(receiver.await.expect("join"), Ok(Some(42)));
        assert!(chan.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_send_blocks_when_full() {
        let ctx = TaskContext::root();
        let chan = Channel::bounded(2);

        chan.send(&ctx, 1).await.expect("send 1");
        chan.send(&ctx, 2).await.expect("send 2");

        let parked = Arc::new(AtomicBool::new(false));
        let tx = chan.clone();
        let tx_ctx = ctx.clone();
        let flag = Arc::clone(&parked);
        let sender = tokio::spawn(async move {
            let res = tx.send(&tx_ctx, 3).await;
            flag.store(true, Ordering::SeqCst);
            res
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!parked.load(Ordering::SeqCst), "third send must block");

        // Draining one item releases the back-pressure.
        assert_eq!(chan.recv(&ctx).await, Ok(Some(1)));
        assert_eq!(sender.await.expect("join"), Ok(()));
        assert_eq!(chan.recv(&ctx).await, Ok(Some(2)));
        assert_eq!(chan.recv(&ctx).await, Ok(Some(3)));
    }

    #[test]
    fn debug_formatting_reports_channel_state() {
        let chan: Channel<u32> = Channel::bounded(2);
        let rendered = format!("{chan:?}");
        assert!(rendered.contains("Bounded(2)"), "got: {rendered}");
        assert!(rendered.contains("closed: false"), "got: {rendered}");
    }

    #[tokio::test]
    async fn send_on_closed_channel_fails() {
        let ctx = TaskContext::root();
        let chan = Channel::unbounded();
        chan.close();
        chan.close(); // idempotent
        assert_eq!(chan.send(&ctx, 1).await, Err(ChannelError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn close_wakes_blocked_sender() {
        let ctx = TaskContext::root();
        let chan = Channel::rendezvous();

        let tx = chan.clone();
        let tx_ctx = ctx.clone();
        let sender = tokio::spawn(async move { tx.send(&tx_ctx, 7).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        chan.close();

        assert_eq!(sender.await.expect("join"), Err(ChannelError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn buffered_items_survive_close() {
        let ctx = TaskContext::root();
        let chan = Channel::bounded(3);
        chan.send(&ctx, 1).await.expect("send");
        chan.send(&ctx, 2).await.expect("send");
        chan.close();

        assert_eq!(chan.recv(&ctx).await, Ok(Some(1)));
        assert_eq!(chan.recv(&ctx).await, Ok(Some(2)));
        assert_eq!(chan.recv(&ctx).await, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_blocked_operations() {
        let root = TaskContext::root();
        let chan: Channel<u32> = Channel::rendezvous();

        let rx = chan.clone();
        let rx_ctx = root.child();
        let receiver = tokio::spawn(async move { rx.recv(&rx_ctx).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        root.cancel();

        assert_eq!(receiver.await.expect("join"), Err(ChannelError::Canceled));
        // Post-cancel operations fail fast.
        assert_eq!(chan.send(&root, 1).await, Err(ChannelError::Canceled));
    }

    /// Ping/pong over one rendezvous channel: FIFO receiver wake-up means
    /// the peers alternate strictly, so their receive counts never drift
    /// apart by more than the in-flight token.
    #[tokio::test(start_paused = true)]
    async fn rendezvous_exchange_is_fair() {
        let root = TaskContext::root();
        let table: Channel<u64> = Channel::rendezvous();

        async fn player(
            table: Channel<u64>,
            ctx: TaskContext,
            hits: Arc<AtomicU32>,
        ) -> Result<(), TaskError> {
            loop {
                let ball = match table.recv(&ctx).await {
                    Ok(Some(ball)) => ball,
                    Ok(None) => return Ok(()),
                    Err(_) => return Err(TaskError::Canceled),
                };
                hits.fetch_add(1, Ordering::SeqCst);
                ctx.sleep(Duration::from_millis(100)).await?;
                match table.send(&ctx, ball + 1).await {
                    Ok(()) => {}
                    Err(_) => return Err(TaskError::Canceled),
                }
            }
        }

        let ping_hits = Arc::new(AtomicU32::new(0));
        let pong_hits = Arc::new(AtomicU32::new(0));
        let ping = tokio::spawn(player(
            table.clone(),
            root.child(),
            Arc::clone(&ping_hits),
        ));
        let pong = tokio::spawn(player(
            table.clone(),
            root.child(),
            Arc::clone(&pong_hits),
        ));

        table.send(&root, 0).await.expect("serve");
        tokio::time::sleep(Duration::from_secs(1)).await;
        root.cancel();
        let _ = ping.await;
        let _ = pong.await;

        let a = ping_hits.load(Ordering::SeqCst) as i64;
        let b = pong_hits.load(Ordering::SeqCst) as i64;
        assert!(a > 0 && b > 0, "both players must touch the ball");
        assert!(
            (a - b).abs() <= 1,
            "unfair exchange: ping={a} pong={b}"
        );
    }
}
