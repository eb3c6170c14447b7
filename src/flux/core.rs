//! Stream construction and lazy operators.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::context::ExecContext;
use crate::error::TaskError;

type EmitFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;
type Producer<T> = Arc<dyn Fn(Emitter<T>) -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;

/// Downstream hand-off given to a stream producer.
///
/// [`Emitter::emit`] is a suspension point: it completes only once the
/// value has passed every operator stage and been taken by the collector,
/// and it observes cancellation while blocked. A transform or filter stage
/// runs *inside* the producer's emit call; there is no buffering between
/// stages.
pub struct Emitter<T> {
    emit_fn: EmitFn<T>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            emit_fn: Arc::clone(&self.emit_fn),
        }
    }
}

impl<T: Send + 'static> Emitter<T> {
    pub(super) fn new(emit_fn: EmitFn<T>) -> Self {
        Self { emit_fn }
    }

    /// Hands one value downstream; suspends until it is consumed.
    pub async fn emit(&self, value: T) -> Result<(), TaskError> {
        (self.emit_fn)(value).await
    }
}

/// A cold, demand-driven stream of values.
///
/// Inert until collected; every call to
/// [`collect`](Flux::collect) restarts production from the beginning.
/// Cloning clones the description, not any running production.
///
/// # Example
/// ```
/// use corral::{Flux, TaskContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubled = Flux::from_iter(1..=3).transform(|x| x * 2);
///
/// let mut seen = Vec::new();
/// doubled
///     .collect(&TaskContext::root(), |x| seen.push(x))
///     .await
///     .expect("runs to completion");
/// assert_eq!(seen, vec![2, 4, 6]);
/// # }
/// ```
pub struct Flux<T> {
    pub(super) producer: Producer<T>,
    pub(super) context: ExecContext,
}

impl<T> Clone for Flux<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            context: self.context.clone(),
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Creates a stream from a producer body. The body runs once per
    /// collection, on the stream's execution context (parallel unless
    /// overridden with [`Flux::run_on`]).
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: Fn(Emitter<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self {
            producer: Arc::new(move |emitter| body(emitter).boxed()),
            context: ExecContext::parallel(),
        }
    }

    /// Creates a stream emitting the items of `iter`, in order.
    ///
    /// The iterator source is cloned per collection, keeping the stream
    /// cold.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send,
    {
        Self::new(move |emitter| {
            let iter = iter.clone();
            async move {
                for value in iter {
                    emitter.emit(value).await?;
                }
                Ok(())
            }
        })
    }

    /// Moves production onto `context`. Operators and the collector are
    /// unaffected; only the producer body is relocated.
    pub fn run_on(mut self, context: ExecContext) -> Self {
        self.context = context;
        self
    }

    /// Per-value mapping stage. Lazy: `f` runs inside the producer's emit
    /// call, once per collected value.
    pub fn transform<U, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_transform(move |value| Ok(f(value)))
    }

    /// Fallible mapping stage. An `Err` from `f` aborts production: the
    /// error propagates out of the producer's pending `emit` and surfaces
    /// to the collector after all previously delivered values.
    pub fn try_transform<U, F>(self, f: F) -> Flux<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U, TaskError> + Send + Sync + 'static,
    {
        let Flux { producer, context } = self;
        let f = Arc::new(f);
        Flux {
            context,
            producer: Arc::new(move |down: Emitter<U>| {
                let f = Arc::clone(&f);
                let up = Emitter::new(Arc::new(move |value: T| {
                    let down = down.clone();
                    let f = Arc::clone(&f);
                    async move { down.emit(f(value)?).await }.boxed()
                }));
                (producer)(up)
            }),
        }
    }

    /// Keeps only values matching `predicate`. Lazy, like
    /// [`Flux::transform`]; a filtered-out value completes the producer's
    /// emit immediately.
    pub fn filter<F>(self, predicate: F) -> Flux<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let Flux { producer, context } = self;
        let predicate = Arc::new(predicate);
        Flux {
            context,
            producer: Arc::new(move |down: Emitter<T>| {
                let predicate = Arc::clone(&predicate);
                let up = Emitter::new(Arc::new(move |value: T| {
                    let down = down.clone();
                    let predicate = Arc::clone(&predicate);
                    async move {
                        if predicate(&value) {
                            down.emit(value).await
                        } else {
                            Ok(())
                        }
                    }
                    .boxed()
                }));
                (producer)(up)
            }),
        }
    }
}
