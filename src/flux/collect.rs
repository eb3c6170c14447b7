//! Stream collection: the terminal operation that starts production.

use std::future::{ready, Future};
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;

use crate::channel::Channel;
use crate::context::TaskContext;
use crate::error::{ChannelError, CollectOutcome, FluxError, TaskError};
use crate::flux::core::{Emitter, Flux};

impl<T: Send + 'static> Flux<T> {
    /// Collects the stream to completion, invoking `sink` once per value,
    /// in emission order.
    ///
    /// Starts production; the producer runs on the stream's execution
    /// context under a context derived from `ctx`, so cancelling `ctx`
    /// stops production. A production error surfaces here after every
    /// value already handed to `sink`.
    pub async fn collect<F>(&self, ctx: &TaskContext, mut sink: F) -> Result<(), FluxError>
    where
        F: FnMut(T),
    {
        self.run_collect(ctx, None, move |value| {
            sink(value);
            ready(())
        })
        .await
        .map(|_| ())
    }

    /// Like [`Flux::collect`], for sinks that suspend.
    ///
    /// The producer's next emit waits for the sink's future to complete, so
    /// a slow consumer back-pressures production (there is no buffering
    /// between them).
    pub async fn collect_async<F, Fut>(&self, ctx: &TaskContext, sink: F) -> Result<(), FluxError>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.run_collect(ctx, None, sink).await.map(|_| ())
    }

    /// Collects with a deadline. If the stream completes first, returns
    /// [`CollectOutcome::Completed`]; once `limit` elapses, production is
    /// cancelled, joined, and [`CollectOutcome::TimedOut`] is returned.
    ///
    /// Values handed to `sink` before the deadline are kept; hitting the
    /// deadline is an outcome, not an error.
    pub async fn collect_with_timeout<F>(
        &self,
        ctx: &TaskContext,
        limit: Duration,
        mut sink: F,
    ) -> Result<CollectOutcome, FluxError>
    where
        F: FnMut(T),
    {
        self.run_collect(ctx, Some(limit), move |value| {
            sink(value);
            ready(())
        })
        .await
    }

    async fn run_collect<F, Fut>(
        &self,
        ctx: &TaskContext,
        limit: Option<Duration>,
        mut sink: F,
    ) -> Result<CollectOutcome, FluxError>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        if ctx.is_canceled() {
            return Err(FluxError::Canceled);
        }

        let prod_ctx = ctx.child();
        let chan: Channel<T> = Channel::rendezvous();

        // Rendezvous hand-off keeps the stream demand-driven: emit()
        // completes only when the collector takes the value.
        let emitter = {
            let chan = chan.clone();
            let ctx = prod_ctx.clone();
            Emitter::new(Arc::new(move |value: T| {
                let chan = chan.clone();
                let ctx = ctx.clone();
                async move { Ok(chan.send(&ctx, value).await?) }.boxed()
            }))
        };
        let production = {
            let producer = Arc::clone(&self.producer);
            let chan = chan.clone();
            self.context.spawn(async move {
                let res = (producer)(emitter).await;
                chan.close();
                res
            })
        };

        let deadline = limit.map(|d| tokio::time::Instant::now() + d);
        let mut timed_out = false;
        let consumed: Result<(), FluxError> = loop {
            let next = match deadline {
                Some(at) => {
                    tokio::select! {
                        biased;
                        res = chan.recv(ctx) => res,
                        _ = tokio::time::sleep_until(at) => {
                            timed_out = true;
                            break Ok(());
                        }
                    }
                }
                None => chan.recv(ctx).await,
            };
            match next {
                Ok(Some(value)) => sink(value).await,
                Ok(None) => break Ok(()),
                Err(ChannelError::Canceled) => break Err(FluxError::Canceled),
                // recv does not report Closed, but stay total.
                Err(ChannelError::Closed) => break Ok(()),
            }
        };

        if timed_out || consumed.is_err() {
            prod_ctx.cancel();
        }
        // The producer is joined on every path: it either finished, or the
        // cancellation above unblocks its pending emit.
        let produced = production.await;
        consumed?;

        match produced {
            Ok(Ok(())) | Ok(Err(TaskError::Canceled)) if timed_out => {
                Ok(CollectOutcome::TimedOut)
            }
            Ok(Ok(())) => Ok(CollectOutcome::Completed),
            Ok(Err(TaskError::Canceled)) => {
                if ctx.is_canceled() {
                    Err(FluxError::Canceled)
                } else {
                    Ok(CollectOutcome::Completed)
                }
            }
            Ok(Err(TaskError::Failed { error })) => Err(FluxError::Production { error }),
            Err(_) => Err(FluxError::Production {
                error: "stream producer panicked".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecContext;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn delayed_numbers(step: Duration, upto: u32) -> Flux<u32> {
        Flux::new(move |emitter| async move {
            for i in 1..=upto {
                tokio::time::sleep(step).await;
                emitter.emit(i).await?;
            }
            Ok(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn collect_delivers_values_in_order() {
        let ctx = TaskContext::root();
        let mut seen = Vec::new();
        delayed_numbers(Duration::from_millis(100), 3)
            .collect(&ctx, |v| seen.push(v))
            .await
            .expect("completes");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn nothing_runs_until_collected_and_each_collection_restarts() {
        let ctx = TaskContext::root();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let flux = Flux::new(move |emitter| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                emitter.emit(7u32).await
            }
        });

        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0, "cold until collected");

        for _ in 0..2 {
            let mut seen = Vec::new();
            flux.collect(&ctx, |v| seen.push(v)).await.expect("run");
            assert_eq!(seen, vec![7]);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2, "restarts from scratch");
    }

    #[tokio::test(start_paused = true)]
    async fn suspending_sink_back_pressures_production() {
        let ctx = TaskContext::root();
        let start = tokio::time::Instant::now();

        // Producer takes 100ms per value, the collector 300ms. With no
        // buffering between them, the collector's pace dominates.
        let mut seen = Vec::new();
        delayed_numbers(Duration::from_millis(100), 3)
            .collect_async(&ctx, |v| {
                seen.push(v);
                tokio::time::sleep(Duration::from_millis(300))
            })
            .await
            .expect("completes");

        assert_eq!(seen, vec![1, 2, 3]);
        assert!(
            start.elapsed() >= Duration::from_millis(1000),
            "producer must not run ahead of the suspended sink"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn operators_compose_lazily() {
        let ctx = TaskContext::root();
        let mut seen = Vec::new();
        Flux::from_iter(1u32..=6)
            .filter(|x| x % 2 == 0)
            .transform(|x| x * 10)
            .collect(&ctx, |v| seen.push(v))
            .await
            .expect("completes");
        assert_eq!(seen, vec![20, 40, 60]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_partial_values_and_reports_timed_out() {
        let ctx = TaskContext::root();
        let mut seen = Vec::new();
        let outcome = delayed_numbers(Duration::from_millis(100), 3)
            .collect_with_timeout(&ctx, Duration::from_millis(250), |v| seen.push(v))
            .await
            .expect("timeout is not an error");
        assert_eq!(outcome, CollectOutcome::TimedOut);
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_stream_completes_before_deadline() {
        let ctx = TaskContext::root();
        let mut seen = Vec::new();
        let outcome = delayed_numbers(Duration::from_millis(10), 3)
            .collect_with_timeout(&ctx, Duration::from_secs(1), |v| seen.push(v))
            .await
            .expect("completes");
        assert_eq!(outcome, CollectOutcome::Completed);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn production_error_truncates_the_stream() {
        let ctx = TaskContext::root();
        let mut seen = Vec::new();
        let err = Flux::from_iter(0u32..10)
            .try_transform(|x| {
                if x <= 1 {
                    Ok(x)
                } else {
                    Err(TaskError::failed(format!("crashed on {x}")))
                }
            })
            .collect(&ctx, |v| seen.push(v))
            .await
            .expect_err("stage error surfaces");
        assert_eq!(seen, vec![0, 1], "values before the error are kept");
        assert_eq!(
            err,
            FluxError::Production {
                error: "crashed on 2".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn generator_error_surfaces_after_delivered_values() {
        let ctx = TaskContext::root();
        let flux: Flux<u32> = Flux::new(|emitter| async move {
            emitter.emit(1).await?;
            Err(TaskError::failed("generator broke"))
        });
        let mut seen = Vec::new();
        let err = flux
            .collect(&ctx, |v| seen.push(v))
            .await
            .expect_err("generator error");
        assert_eq!(seen, vec![1]);
        assert_eq!(
            err,
            FluxError::Production {
                error: "generator broke".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_the_collector_stops_production() {
        let ctx = TaskContext::root();
        let consumer = ctx.child();

        let collector = tokio::spawn(async move {
            delayed_numbers(Duration::from_millis(100), u32::MAX)
                .collect(&consumer, |_| {})
                .await
        });
        tokio::time::sleep(Duration::from_millis(350)).await;
        ctx.cancel();

        let res = collector.await.expect("join");
        assert_eq!(res, Err(FluxError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn run_on_main_still_delivers_everything() {
        let ctx = TaskContext::root();
        let mut seen = Vec::new();
        Flux::from_iter(1u32..=5)
            .run_on(ExecContext::main())
            .transform(|x| x + 100)
            .collect(&ctx, |v| seen.push(v))
            .await
            .expect("completes");
        assert_eq!(seen, vec![101, 102, 103, 104, 105]);
    }
}
