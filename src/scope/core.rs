//! # Scope: an owning, cancellable container of concurrent tasks.
//!
//! A [`Scope`] enforces structured concurrency:
//!
//! - every task is owned by exactly one scope (no detached work),
//! - cancelling a scope cancels all current and future children,
//! - a scope is complete only after every child observably stopped.
//!
//! ## Architecture
//! ```text
//!            caller
//!              │ submit / submit_with_result
//!              ▼
//! ┌─────────────────────────────────────────────────────┐
//! │ Scope                                               │
//! │  - TaskContext (cancellation root, child per task)  │
//! │  - ErrorPolicy (fail-fast | isolate)                │
//! │  - Bus (lifecycle events) ──► observers (optional)  │
//! │  - children: task slots + nested scopes             │
//! └──────┬───────────────┬──────────────────┬───────────┘
//!        ▼               ▼                  ▼
//!   task wrapper    task wrapper       nested Scope
//!   (child token)   (child token)      (child token)
//!        │               │
//!        │ publishes TaskStarting / TaskCompleted /
//!        │           TaskFailed / TaskCanceled
//!        ▼
//!   terminal status ──► await_all() collects ChildReports
//! ```
//!
//! ## Failure semantics
//! An unhandled error in a task body becomes that task's terminal `Failed`
//! state. Under [`ErrorPolicy::FailFast`] the first failure cancels the
//! remaining siblings and `await_all` raises it after everything unwound;
//! under [`ErrorPolicy::Isolate`] siblings keep running and `await_all`
//! returns the collected outcomes. A failure hook attached at build time
//! observes every terminal failure exactly once, for logging/reporting,
//! and never alters propagation. Cancellation is not a failure and never
//! cascades.
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use corral::{ErrorPolicy, Scope, TaskError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scope = Scope::builder().policy(ErrorPolicy::Isolate).build();
//!
//! let answer = scope.submit_with_result("answer", |ctx| async move {
//!     ctx.sleep(Duration::from_millis(1)).await?;
//!     Ok::<_, TaskError>(42)
//! });
//! scope.submit("boom", |_ctx| async move { Err(TaskError::failed("boom")) });
//!
//! assert_eq!(answer.value().await, Ok(42));
//! let reports = scope.await_all().await.expect("isolate never raises");
//! assert_eq!(reports.len(), 2);
//! # }
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::context::TaskContext;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::observers::Observe;
use crate::scope::config::{ErrorPolicy, ScopeConfig};
use crate::scope::handle::{Outcome, TaskHandle};

/// Global scope identifier source.
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

type FailureHook = Arc<dyn Fn(&str, &TaskError) + Send + Sync>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Extracts a readable message from a caught panic payload.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}

/// Terminal state of one child, as collected by
/// [`Scope::await_all`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChildStatus {
    /// The body returned successfully.
    Completed,
    /// The body returned a failure, or panicked.
    Failed(TaskError),
    /// The child stopped at a suspension point due to cancellation, or
    /// never ran.
    Canceled,
}

/// One child's terminal outcome, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildReport {
    /// Name given at submission (`scope-<id>` for nested scopes that
    /// surfaced a failure).
    pub name: Arc<str>,
    /// Terminal state.
    pub status: ChildStatus,
}

struct ChildSlot {
    name: Arc<str>,
    done: JoinHandle<ChildStatus>,
}

#[derive(Default)]
struct Children {
    tasks: Vec<ChildSlot>,
    nested: Vec<Scope>,
}

struct ScopeInner {
    id: u64,
    policy: ErrorPolicy,
    context: crate::context::ExecContext,
    ctx: TaskContext,
    bus: Bus,
    hook: Option<FailureHook>,
    cancel_announced: AtomicBool,
    first_failure: Mutex<Option<TaskError>>,
    children: Mutex<Children>,
}

impl ScopeInner {
    /// Requests cancellation; publishes the event once.
    fn cancel(&self) {
        self.ctx.cancel();
        if !self.cancel_announced.swap(true, Ordering::SeqCst) {
            self.bus
                .publish(Event::new(EventKind::ScopeCancelRequested).with_scope(self.id));
        }
    }

    /// Records a failure for `await_all` and cascades under fail-fast.
    /// Does not invoke the hook (the failure was observed where it
    /// happened).
    fn record_failure(&self, err: &TaskError) {
        {
            let mut first = lock(&self.first_failure);
            if first.is_none() {
                *first = Some(err.clone());
            }
        }
        if self.policy == ErrorPolicy::FailFast {
            self.cancel();
        }
    }

    /// Hook observation (exactly once per failure) plus recording.
    fn observe_failure(&self, name: &str, err: &TaskError) {
        if let Some(hook) = &self.hook {
            hook(name, err);
        }
        self.record_failure(err);
    }
}

/// Owning, cancellable container of concurrent tasks.
///
/// Cheap to clone; all clones refer to the same scope.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Creates a scope from a configuration, without observers or a
    /// failure hook. See [`Scope::builder`] for the full surface.
    pub fn new(config: ScopeConfig) -> Self {
        Self::with_parts(config.policy, config.context, Bus::new(config.bus_capacity), None, None)
    }

    /// Starts building a scope.
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    fn with_parts(
        policy: ErrorPolicy,
        context: crate::context::ExecContext,
        bus: Bus,
        hook: Option<FailureHook>,
        parent: Option<&TaskContext>,
    ) -> Self {
        let ctx = match parent {
            Some(parent) => parent.child(),
            None => TaskContext::root(),
        };
        Self {
            inner: Arc::new(ScopeInner {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
                policy,
                context,
                ctx,
                bus,
                hook,
                cancel_announced: AtomicBool::new(false),
                first_failure: Mutex::new(None),
                children: Mutex::new(Children::default()),
            }),
        }
    }

    /// Unique identifier of this scope.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The scope's failure-propagation policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.inner.policy
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.inner.ctx.is_canceled()
    }

    /// Requests cancellation of this scope and every current and future
    /// child, transitively through nested scopes. Idempotent and
    /// irreversible; propagation is cooperative (children stop at their
    /// next suspension point).
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Submits a fire-and-forget task. Returns immediately.
    ///
    /// If the scope is already cancelled the task is recorded `Canceled`
    /// without running.
    pub fn submit<F, Fut>(&self, name: impl Into<Arc<str>>, body: F) -> TaskHandle<()>
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.submit_with_result(name, body)
    }

    /// Submits a value-producing task. Returns immediately; the handle
    /// resolves to the task's terminal [`Outcome`].
    pub fn submit_with_result<T, F, Fut>(
        &self,
        name: impl Into<Arc<str>>,
        body: F,
    ) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let name: Arc<str> = name.into();
        let (tx, rx) = oneshot::channel::<Outcome<T>>();
        let inner = Arc::clone(&self.inner);

        if inner.ctx.is_canceled() {
            inner.bus.publish(
                Event::new(EventKind::TaskCanceled)
                    .with_task(Arc::clone(&name))
                    .with_scope(inner.id),
            );
            let _ = tx.send(Outcome::Canceled);
            let done = tokio::spawn(async { ChildStatus::Canceled });
            lock(&inner.children).tasks.push(ChildSlot {
                name: Arc::clone(&name),
                done,
            });
            return TaskHandle::new(name, rx);
        }

        let task_ctx = inner.ctx.child();
        let wrapper = {
            let inner = Arc::clone(&inner);
            let name = Arc::clone(&name);
            async move {
                inner.bus.publish(
                    Event::new(EventKind::TaskStarting)
                        .with_task(Arc::clone(&name))
                        .with_scope(inner.id),
                );
                // A panicking body is reported as a failure, so the handle
                // and the scope report agree on the terminal state.
                let result = AssertUnwindSafe(async move { body(task_ctx).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(TaskError::failed(panic_message(panic))));
                match result {
                    Ok(value) => {
                        inner.bus.publish(
                            Event::new(EventKind::TaskCompleted)
                                .with_task(Arc::clone(&name))
                                .with_scope(inner.id),
                        );
                        let _ = tx.send(Outcome::Completed(value));
                        ChildStatus::Completed
                    }
                    Err(TaskError::Canceled) => {
                        inner.bus.publish(
                            Event::new(EventKind::TaskCanceled)
                                .with_task(Arc::clone(&name))
                                .with_scope(inner.id),
                        );
                        let _ = tx.send(Outcome::Canceled);
                        ChildStatus::Canceled
                    }
                    Err(err) => {
                        inner.bus.publish(
                            Event::new(EventKind::TaskFailed)
                                .with_task(Arc::clone(&name))
                                .with_scope(inner.id)
                                .with_reason(err.to_string()),
                        );
                        inner.observe_failure(&name, &err);
                        let _ = tx.send(Outcome::Failed(err.clone()));
                        ChildStatus::Failed(err)
                    }
                }
            }
        };
        let done = inner.context.spawn(wrapper);
        lock(&inner.children).tasks.push(ChildSlot {
            name: Arc::clone(&name),
            done,
        });
        TaskHandle::new(name, rx)
    }

    /// Creates a nested scope whose lifetime is bounded by this one.
    ///
    /// Cancelling the parent cancels the nested scope transitively; the
    /// parent's [`Scope::await_all`] drains nested scopes too. The nested
    /// scope's own `policy` decides what it surfaces to the parent: an
    /// `Isolate` nested scope absorbs its children's failures, a
    /// `FailFast` one surfaces the first as a single child failure of the
    /// parent.
    pub fn nested(&self, policy: ErrorPolicy) -> Scope {
        let child = Scope::with_parts(
            policy,
            self.inner.context.clone(),
            self.inner.bus.clone(),
            self.inner.hook.clone(),
            Some(&self.inner.ctx),
        );
        lock(&self.inner.children).nested.push(child.clone());
        child
    }

    /// Suspends until every child (and nested scope) reached a terminal
    /// state; never returns while any descendant is still running.
    ///
    /// - `FailFast`: returns `Err(first failure)` after all siblings have
    ///   unwound, `Ok(reports)` otherwise.
    /// - `Isolate`: always returns `Ok(reports)`, failures included.
    ///
    /// Children submitted while draining are awaited as well.
    pub async fn await_all(&self) -> Result<Vec<ChildReport>, TaskError> {
        let reports = self.drain().await;
        self.inner
            .bus
            .publish(Event::new(EventKind::ScopeDrained).with_scope(self.inner.id));
        match self.inner.policy {
            ErrorPolicy::FailFast => match lock(&self.inner.first_failure).clone() {
                Some(err) => Err(err),
                None => Ok(reports),
            },
            ErrorPolicy::Isolate => Ok(reports),
        }
    }

    // Boxed for recursion through nested scopes.
    fn drain(&self) -> BoxFuture<'_, Vec<ChildReport>> {
        async move {
            let mut reports = Vec::new();
            loop {
                let Children { tasks, nested } = {
                    let mut children = lock(&self.inner.children);
                    std::mem::take(&mut *children)
                };
                if tasks.is_empty() && nested.is_empty() {
                    break;
                }
                for slot in tasks {
                    let status = match slot.done.await {
                        Ok(status) => status,
                        Err(err) if err.is_panic() => {
                            // Fallback for a panic that escaped the
                            // wrapper's catch; the hook still sees it.
                            let failure = TaskError::failed("task panicked");
                            self.inner.observe_failure(&slot.name, &failure);
                            ChildStatus::Failed(failure)
                        }
                        Err(_) => ChildStatus::Canceled,
                    };
                    reports.push(ChildReport {
                        name: slot.name,
                        status,
                    });
                }
                for scope in nested {
                    match scope.await_all().await {
                        Ok(mut nested_reports) => reports.append(&mut nested_reports),
                        Err(err) => {
                            // The nested scope already ran the hook for the
                            // original failure; only record and cascade.
                            self.inner.record_failure(&err);
                            reports.push(ChildReport {
                                name: format!("scope-{}", scope.id()).into(),
                                status: ChildStatus::Failed(err),
                            });
                        }
                    }
                }
            }
            reports
        }
        .boxed()
    }

}

/// Builder for [`Scope`].
///
/// # Example
/// ```
/// use corral::{ErrorPolicy, ExecContext, Scope};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scope = Scope::builder()
///     .policy(ErrorPolicy::Isolate)
///     .context(ExecContext::main())
///     .on_failure(|task, err| eprintln!("{task}: {err}"))
///     .build();
/// # drop(scope);
/// # }
/// ```
pub struct ScopeBuilder {
    config: ScopeConfig,
    hook: Option<FailureHook>,
    observers: Vec<Arc<dyn Observe>>,
    parent: Option<TaskContext>,
}

impl ScopeBuilder {
    fn new() -> Self {
        Self {
            config: ScopeConfig::default(),
            hook: None,
            observers: Vec::new(),
            parent: None,
        }
    }

    /// Sets the failure-propagation policy (default: `FailFast`).
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Sets the execution context for task bodies (default: parallel).
    pub fn context(mut self, context: crate::context::ExecContext) -> Self {
        self.config.context = context;
        self
    }

    /// Sets the lifecycle event bus capacity (default: 256).
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.config.bus_capacity = capacity;
        self
    }

    /// Attaches a failure hook observing every terminal task failure
    /// exactly once. The hook must not block; it never alters propagation.
    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &TaskError) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Attaches an observer for lifecycle events. With at least one
    /// observer, `build()` spawns a listener task and therefore must run
    /// inside a tokio runtime.
    pub fn observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Bounds the scope's lifetime by an external context: cancelling
    /// `parent` cancels the scope.
    pub fn parent(mut self, parent: &TaskContext) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Builds the scope.
    pub fn build(self) -> Scope {
        let bus = Bus::new(self.config.bus_capacity);
        if !self.observers.is_empty() {
            let mut rx = bus.subscribe();
            let observers = self.observers;
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(ev) => {
                            for observer in &observers {
                                observer.on_event(&ev).await;
                            }
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }
        Scope::with_parts(
            self.config.policy,
            self.config.context,
            bus,
            self.hook,
            self.parent.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn await_all_waits_for_every_child() {
        let scope = Scope::new(ScopeConfig::default());
        let finished = Arc::new(AtomicUsize::new(0));

        for i in 0..3u64 {
            let finished = Arc::clone(&finished);
            scope.submit(format!("task-{i}"), move |ctx| async move {
                ctx.sleep(Duration::from_millis(50 * (i + 1))).await?;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let reports = scope.await_all().await.expect("no failures");
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.status == ChildStatus::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_cancels_siblings_and_raises_first_failure() {
        let scope = Scope::builder().policy(ErrorPolicy::FailFast).build();

        scope.submit("failing", |ctx| async move {
            ctx.sleep(Duration::from_millis(100)).await?;
            Err(TaskError::failed("boom"))
        });
        let slow = scope.submit_with_result("slow", |ctx| async move {
            ctx.sleep(Duration::from_millis(500)).await?;
            Ok::<_, TaskError>(5)
        });

        let err = scope.await_all().await.expect_err("must raise");
        assert_eq!(err, TaskError::failed("boom"));
        assert_eq!(slow.join().await, Outcome::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn isolate_collects_outcomes_without_cascading() {
        let scope = Scope::builder().policy(ErrorPolicy::Isolate).build();

        scope.submit("failing", |ctx| async move {
            ctx.sleep(Duration::from_millis(100)).await?;
            Err(TaskError::failed("boom"))
        });
        let slow = scope.submit_with_result("slow", |ctx| async move {
            ctx.sleep(Duration::from_millis(500)).await?;
            Ok::<_, TaskError>(5)
        });

        let reports = scope.await_all().await.expect("isolate never raises");
        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].status,
            ChildStatus::Failed(TaskError::failed("boom"))
        );
        assert_eq!(reports[1].status, ChildStatus::Completed);
        assert_eq!(slow.value().await, Ok(5));
    }

    #[tokio::test]
    async fn submit_after_cancel_never_runs_the_body() {
        let scope = Scope::new(ScopeConfig::default());
        scope.cancel();
        scope.cancel(); // idempotent

        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        let handle = scope.submit("late", move |_ctx| async move {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(handle.join().await, Outcome::Canceled);
        // Cancellation is not a failure: the scope drains cleanly.
        let reports = scope.await_all().await.expect("no failure recorded");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, ChildStatus::Canceled);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_hook_observes_each_failure_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let scope = Scope::builder()
            .policy(ErrorPolicy::Isolate)
            .on_failure(move |_task, _err| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        scope.submit("a", |_ctx| async { Err(TaskError::failed("a")) });
        scope.submit("b", |_ctx| async { Err(TaskError::failed("b")) });
        scope.submit("c", |ctx| async move {
            ctx.sleep(Duration::from_millis(10)).await?;
            Ok(())
        });

        scope.await_all().await.expect("isolate");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn panicking_body_resolves_handle_and_report_as_failed() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let scope = Scope::builder()
            .policy(ErrorPolicy::Isolate)
            .on_failure(move |_task, _err| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let handle = scope.submit_with_result("bomb", |_ctx| async move {
            if true {
                panic!("wires crossed");
            }
            Ok::<_, TaskError>(0u32)
        });

        let expected = TaskError::failed("task panicked: wires crossed");
        assert_eq!(handle.join().await, Outcome::Failed(expected.clone()));

        let reports = scope.await_all().await.expect("isolate");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, ChildStatus::Failed(expected));
        assert_eq!(seen.load(Ordering::SeqCst), 1, "hook fires exactly once");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_parent_reaches_nested_tasks() {
        let parent = Scope::new(ScopeConfig::default());
        let nested = parent.nested(ErrorPolicy::FailFast);

        let ticker = nested.submit("ticker", |ctx| async move {
            loop {
                ctx.sleep(Duration::from_millis(50)).await?;
            }
        });

        tokio::time::sleep(Duration::from_millis(120)).await;
        parent.cancel();

        assert_eq!(ticker.join().await, Outcome::Canceled);
        let reports = parent.await_all().await.expect("cancellation only");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, ChildStatus::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn isolate_nested_in_fail_fast_absorbs_failures() {
        let parent = Scope::builder().policy(ErrorPolicy::FailFast).build();
        let nested = parent.nested(ErrorPolicy::Isolate);

        nested.submit("grandchild", |_ctx| async { Err(TaskError::failed("inner")) });
        let sibling = parent.submit_with_result("sibling", |ctx| async move {
            ctx.sleep(Duration::from_millis(50)).await?;
            Ok::<_, TaskError>("ok")
        });

        let reports = parent.await_all().await.expect("absorbed");
        assert_eq!(sibling.value().await, Ok("ok"));
        assert!(reports
            .iter()
            .any(|r| r.status == ChildStatus::Failed(TaskError::failed("inner"))));
    }

    /// Prime-sieve pipeline: an infinite generator feeding chained filter
    /// stages. Cancelling the scope must stop every upstream stage — the
    /// generator would otherwise run forever.
    #[tokio::test(start_paused = true)]
    async fn pipeline_cancellation_stops_upstream_stages() {
        let root = TaskContext::root();
        let scope = Scope::new(ScopeConfig::default());

        fn numbers_from(scope: &Scope, start: u32) -> Channel<u32> {
            let out = Channel::rendezvous();
            let tx = out.clone();
            scope.submit("numbers", move |ctx| async move {
                let mut x = start;
                loop {
                    tx.send(&ctx, x).await?;
                    x += 1;
                }
            });
            out
        }

        fn sieve_stage(scope: &Scope, input: Channel<u32>, prime: u32) -> Channel<u32> {
            let out = Channel::rendezvous();
            let tx = out.clone();
            scope.submit(format!("sieve-{prime}"), move |ctx| async move {
                while let Some(x) = input.recv(&ctx).await? {
                    if x % prime != 0 {
                        tx.send(&ctx, x).await?;
                    }
                }
                tx.close();
                Ok(())
            });
            out
        }

        let mut cur = numbers_from(&scope, 2);
        let mut primes = Vec::new();
        for _ in 0..10 {
            let prime = cur
                .recv(&root)
                .await
                .expect("recv")
                .expect("infinite stream");
            primes.push(prime);
            cur = sieve_stage(&scope, cur, prime);
        }
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);

        scope.cancel();
        let reports = scope.await_all().await.expect("only cancellations");
        assert!(reports
            .iter()
            .all(|r| r.status == ChildStatus::Canceled));
    }
}
