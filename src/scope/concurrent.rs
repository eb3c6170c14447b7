//! Ad-hoc concurrent composition without an explicit scope.
//!
//! [`run_concurrently`] and [`join_all`] wrap a throwaway fail-fast
//! [`Scope`]: the futures start together, the first failure cancels the
//! rest, and nothing outlives the call.

use std::future::Future;

use crate::context::TaskContext;
use crate::error::TaskError;
use crate::scope::config::ErrorPolicy;
use crate::scope::core::Scope;
use crate::scope::handle::Outcome;

/// Runs two cancellable futures concurrently and returns both values.
///
/// Fail-fast: if either side fails, the other is cancelled at its next
/// suspension point and the failure is raised. Cancelling `ctx` cancels
/// both sides and raises [`TaskError::Canceled`].
pub async fn run_concurrently<A, B, FA, FB, FutA, FutB>(
    ctx: &TaskContext,
    a: FA,
    b: FB,
) -> Result<(A, B), TaskError>
where
    A: Send + 'static,
    B: Send + 'static,
    FA: FnOnce(TaskContext) -> FutA + Send + 'static,
    FB: FnOnce(TaskContext) -> FutB + Send + 'static,
    FutA: Future<Output = Result<A, TaskError>> + Send + 'static,
    FutB: Future<Output = Result<B, TaskError>> + Send + 'static,
{
    let scope = Scope::builder()
        .policy(ErrorPolicy::FailFast)
        .parent(ctx)
        .build();
    let left = scope.submit_with_result("left", a);
    let right = scope.submit_with_result("right", b);

    let (left, right) = tokio::join!(left.join(), right.join());
    scope.await_all().await?;
    match (left, right) {
        (Outcome::Completed(a), Outcome::Completed(b)) => Ok((a, b)),
        (Outcome::Failed(e), _) | (_, Outcome::Failed(e)) => Err(e),
        _ => Err(TaskError::Canceled),
    }
}

/// Runs a batch of cancellable futures concurrently, returning the values
/// in submission order. Fail-fast, like [`run_concurrently`].
pub async fn join_all<T, F, Fut, I>(ctx: &TaskContext, bodies: I) -> Result<Vec<T>, TaskError>
where
    T: Send + 'static,
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    I: IntoIterator<Item = F>,
{
    let scope = Scope::builder()
        .policy(ErrorPolicy::FailFast)
        .parent(ctx)
        .build();
    let handles: Vec<_> = bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| scope.submit_with_result(format!("batch-{i}"), body))
        .collect();

    let expected = handles.len();
    let mut values = Vec::with_capacity(expected);
    let mut first_failure = None;
    for handle in handles {
        match handle.join().await {
            Outcome::Completed(v) => values.push(v),
            Outcome::Failed(e) => {
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
            Outcome::Canceled => {}
        }
    }
    scope.await_all().await?;
    match first_failure {
        Some(e) => Err(e),
        None if values.len() == expected => Ok(values),
        None => Err(TaskError::Canceled),
    }
}
