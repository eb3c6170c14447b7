//! Internal channel state machine.
//!
//! All channel mutations (enqueue, dequeue, close, waiter parking) happen
//! inside one mutex-guarded critical section, which is what preserves the
//! FIFO ordering and closed-channel invariants.
//!
//! ## Invariants
//! - Parked receivers exist only while the queue is empty and the channel
//!   is open; an item or a close therefore always goes to the
//!   longest-waiting receiver first (fairness).
//! - Parked senders exist only while no receiver is parked and the buffer
//!   has no room (rendezvous channels never have room).
//! - Waiter deques contain only live waiters: a send/receive future that is
//!   dropped mid-wait removes itself under the state lock.
//!
//! ## Lock order
//! State lock first, then a waiter slot lock. Waiter slots are additionally
//! locked alone by their own future's poll, which never takes the state
//! lock afterwards, so no cycle exists.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use crate::error::ChannelError;

/// Buffer policy of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capacity {
    /// Zero buffer: a send completes only when a receiver takes the item.
    Rendezvous,
    /// Buffer up to `n` items; senders block when full.
    Bounded(usize),
    /// Unlimited buffer; senders never block.
    Unbounded,
}

/// Recovers from mutex poisoning: the protected state is only mutated in
/// small panic-free sections, so the value is still consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SendSlot<T> {
    /// The undelivered item; taken by the receiver (or dropped on close).
    item: Option<T>,
    /// Set exactly once when the wait resolves.
    result: Option<Result<(), ChannelError>>,
    waker: Option<Waker>,
}

struct RecvSlot<T> {
    /// `Some(Some(item))` = delivered, `Some(None)` = end-of-channel.
    value: Option<Option<T>>,
    waker: Option<Waker>,
}

struct SendWaiter<T> {
    slot: Mutex<SendSlot<T>>,
}

struct RecvWaiter<T> {
    slot: Mutex<RecvSlot<T>>,
}

struct State<T> {
    capacity: Capacity,
    queue: VecDeque<T>,
    closed: bool,
    senders: VecDeque<Arc<SendWaiter<T>>>,
    receivers: VecDeque<Arc<RecvWaiter<T>>>,
}

pub(crate) struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = lock(&self.state);
        f.debug_struct("Shared")
            .field("capacity", &st.capacity)
            .field("len", &st.queue.len())
            .field("closed", &st.closed)
            .finish_non_exhaustive()
    }
}

impl<T> Shared<T> {
    pub(crate) fn new(capacity: Capacity) -> Self {
        Self {
            state: Mutex::new(State {
                capacity,
                queue: VecDeque::new(),
                closed: false,
                senders: VecDeque::new(),
                receivers: VecDeque::new(),
            }),
        }
    }

    /// Marks the channel closed. Idempotent.
    ///
    /// Wakes every parked sender with `Closed` (their in-flight items are
    /// dropped) and every parked receiver with end-of-channel. Buffered
    /// items stay receivable.
    pub(crate) fn close(&self) {
        let mut st = lock(&self.state);
        if st.closed {
            return;
        }
        st.closed = true;
        for sw in st.senders.drain(..) {
            let mut slot = lock(&sw.slot);
            slot.item = None;
            slot.result = Some(Err(ChannelError::Closed));
            if let Some(w) = slot.waker.take() {
                w.wake();
            }
        }
        for rw in st.receivers.drain(..) {
            let mut slot = lock(&rw.slot);
            slot.value = Some(None);
            if let Some(w) = slot.waker.take() {
                w.wake();
            }
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.state).queue.len()
    }
}

/// Hands `item` to the longest-waiting receiver, or gives it back.
fn hand_to_receiver<T>(st: &mut State<T>, item: T) -> Result<(), T> {
    if let Some(rw) = st.receivers.pop_front() {
        let mut slot = lock(&rw.slot);
        slot.value = Some(Some(item));
        if let Some(w) = slot.waker.take() {
            w.wake();
        }
        return Ok(());
    }
    Err(item)
}

/// After a dequeue made room, moves the longest-waiting bounded sender's
/// item into the buffer and resolves it (releases back-pressure).
fn promote_parked_sender<T>(st: &mut State<T>) {
    let room = match st.capacity {
        Capacity::Bounded(n) => st.queue.len() < n,
        // Rendezvous senders resolve on direct hand-off only; unbounded
        // senders never park.
        Capacity::Rendezvous | Capacity::Unbounded => false,
    };
    if !room {
        return;
    }
    if let Some(sw) = st.senders.pop_front() {
        let mut slot = lock(&sw.slot);
        if let Some(item) = slot.item.take() {
            st.queue.push_back(item);
            slot.result = Some(Ok(()));
            if let Some(w) = slot.waker.take() {
                w.wake();
            }
        }
    }
}

pub(crate) struct SendFuture<T> {
    shared: Arc<Shared<T>>,
    item: Option<T>,
    waiter: Option<Arc<SendWaiter<T>>>,
    done: bool,
}

impl<T> Unpin for SendFuture<T> {}

impl<T> SendFuture<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>, item: T) -> Self {
        Self {
            shared,
            item: Some(item),
            waiter: None,
            done: false,
        }
    }
}

impl<T> Future for SendFuture<T> {
    type Output = Result<(), ChannelError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(w) = &this.waiter {
            let mut slot = lock(&w.slot);
            if let Some(res) = slot.result.take() {
                drop(slot);
                this.waiter = None;
                this.done = true;
                return Poll::Ready(res);
            }
            slot.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let item = match this.item.take() {
            Some(item) => item,
            None => return Poll::Pending, // already resolved; not re-polled in practice
        };

        let mut st = lock(&this.shared.state);
        if st.closed {
            this.done = true;
            return Poll::Ready(Err(ChannelError::Closed));
        }
        match hand_to_receiver(&mut st, item) {
            Ok(()) => {
                this.done = true;
                Poll::Ready(Ok(()))
            }
            Err(item) => {
                let fits = match st.capacity {
                    Capacity::Unbounded => true,
                    Capacity::Bounded(n) => st.queue.len() < n,
                    Capacity::Rendezvous => false,
                };
                if fits {
                    st.queue.push_back(item);
                    this.done = true;
                    return Poll::Ready(Ok(()));
                }
                let waiter = Arc::new(SendWaiter {
                    slot: Mutex::new(SendSlot {
                        item: Some(item),
                        result: None,
                        waker: Some(cx.waker().clone()),
                    }),
                });
                st.senders.push_back(Arc::clone(&waiter));
                this.waiter = Some(waiter);
                Poll::Pending
            }
        }
    }
}

impl<T> Drop for SendFuture<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let Some(w) = self.waiter.take() else { return };
        let mut st = lock(&self.shared.state);
        st.senders.retain(|s| !Arc::ptr_eq(s, &w));
        // If the slot already resolved, the item was delivered and the
        // cancelled send in fact succeeded; an undelivered item is simply
        // dropped with the waiter.
    }
}

pub(crate) struct RecvFuture<T> {
    shared: Arc<Shared<T>>,
    waiter: Option<Arc<RecvWaiter<T>>>,
    done: bool,
}

impl<T> Unpin for RecvFuture<T> {}

impl<T> RecvFuture<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self {
            shared,
            waiter: None,
            done: false,
        }
    }
}

impl<T> Future for RecvFuture<T> {
    type Output = Result<Option<T>, ChannelError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(w) = &this.waiter {
            let mut slot = lock(&w.slot);
            if let Some(v) = slot.value.take() {
                drop(slot);
                this.waiter = None;
                this.done = true;
                return Poll::Ready(Ok(v));
            }
            slot.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let mut st = lock(&this.shared.state);
        if let Some(item) = st.queue.pop_front() {
            promote_parked_sender(&mut st);
            this.done = true;
            return Poll::Ready(Ok(Some(item)));
        }
        // Queue empty: a parked sender means a rendezvous hand-off.
        while let Some(sw) = st.senders.pop_front() {
            let mut slot = lock(&sw.slot);
            if let Some(item) = slot.item.take() {
                slot.result = Some(Ok(()));
                if let Some(w) = slot.waker.take() {
                    w.wake();
                }
                this.done = true;
                return Poll::Ready(Ok(Some(item)));
            }
        }
        if st.closed {
            this.done = true;
            return Poll::Ready(Ok(None));
        }
        let waiter = Arc::new(RecvWaiter {
            slot: Mutex::new(RecvSlot {
                value: None,
                waker: Some(cx.waker().clone()),
            }),
        });
        st.receivers.push_back(Arc::clone(&waiter));
        this.waiter = Some(waiter);
        Poll::Pending
    }
}

impl<T> Drop for RecvFuture<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let Some(w) = self.waiter.take() else { return };
        let mut st = lock(&self.shared.state);
        st.receivers.retain(|r| !Arc::ptr_eq(r, &w));
        let mut slot = lock(&w.slot);
        if let Some(Some(item)) = slot.value.take() {
            // A delivery raced with cancellation. Put the item back at the
            // head so order is preserved, and pass it on if someone waits.
            drop(slot);
            st.queue.push_front(item);
            if let Some(rw) = st.receivers.pop_front() {
                let mut next = lock(&rw.slot);
                if let Some(item) = st.queue.pop_front() {
                    next.value = Some(Some(item));
                    if let Some(wk) = next.waker.take() {
                        wk.wake();
                    }
                }
            }
        }
    }
}
