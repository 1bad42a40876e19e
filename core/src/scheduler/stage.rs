use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::check::Check;

/// Run every check concurrently, at most `max_concurrency` at a time.
///
/// Completion order is arbitrary; the returned outputs are in input order
/// so reports stay deterministic. Returns only after every future has
/// finished.
pub async fn run_parallel<'c, F, Fut, T>(
    checks: &[&'c Check],
    max_concurrency: usize,
    run: F,
) -> Vec<T>
where
    F: Fn(&'c Check) -> Fut,
    Fut: Future<Output = T>,
{
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut futs = FuturesUnordered::new();

    for (idx, check) in checks.iter().copied().enumerate() {
        let sem = sem.clone();
        let fut = run(check);
        futs.push(async move {
            // The semaphore is never closed, so a failed acquire cannot
            // happen; run unbounded rather than drop the check if it does.
            let _permit = sem.acquire_owned().await.ok();
            (idx, fut.await)
        });
    }

    let mut results = Vec::with_capacity(checks.len());
    while let Some(done) = futs.next().await {
        results.push(done);
    }
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, out)| out).collect()
}

/// Run checks one after another in registration order.
pub async fn run_sequential<'c, F, Fut, T>(checks: &[&'c Check], run: F) -> Vec<T>
where
    F: Fn(&'c Check) -> Fut,
    Fut: Future<Output = T>,
{
    let mut results = Vec::with_capacity(checks.len());
    for check in checks.iter().copied() {
        results.push(run(check).await);
    }
    results
}
