//! Bounded concurrent fan-out over independent period computations.
//!
//! Results come back in input order, whatever order the computations finish
//! in, so series can be assembled by index.

use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

use crate::error::{Error, Result};

/// Boxed future tagged with its input position
type IndexedFuture<'a, T> = Pin<Box<dyn Future<Output = (usize, Result<T>)> + Send + 'a>>;

/// Run `task` for every input, at most `max_concurrent` at a time.
///
/// Every task runs to completion; the returned vector holds one result per
/// input, at the input's index. Callers decide which failures matter.
///
/// # Example
///
/// ```ignore
/// let months: Vec<Period> = ...;
/// let yields = fan_out(months, |m| agg.monthly_yield(m.year_number(), m.month_number()), 8).await;
/// ```
pub async fn fan_out<'a, I, T, F, Fut>(
    inputs: Vec<I>,
    task: F,
    max_concurrent: usize,
) -> Vec<Result<T>>
where
    T: Send + 'a,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'a,
{
    let total = inputs.len();
    if total == 0 {
        return Vec::new();
    }
    let max_concurrent = max_concurrent.max(1);

    debug!(
        "Fanning out {} computations with max {} concurrent",
        total, max_concurrent
    );

    let mut slots: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
    let mut futures: FuturesUnordered<IndexedFuture<'a, T>> = FuturesUnordered::new();
    let mut pending = inputs.into_iter().enumerate();

    let make_future = |index: usize, input: I, f: &F| -> IndexedFuture<'a, T> {
        let fut = f(input);
        Box::pin(async move { (index, fut.await) })
    };

    // Seed initial batch up to max_concurrent
    for (index, input) in pending.by_ref().take(max_concurrent) {
        futures.push(make_future(index, input, &task));
    }

    // Keep the window full until every input has been started
    while let Some((index, result)) = futures.next().await {
        slots[index] = Some(result);

        if let Some((next_index, input)) = pending.next() {
            futures.push(make_future(next_index, input, &task));
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(Error::Other("fan-out slot left empty".to_string()))))
        .collect()
}

/// Like [`fan_out`], but fails with the lowest-index error if any task failed
pub async fn try_fan_out<'a, I, T, F, Fut>(
    inputs: Vec<I>,
    task: F,
    max_concurrent: usize,
) -> Result<Vec<T>>
where
    T: Send + 'a,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'a,
{
    fan_out(inputs, task, max_concurrent)
        .await
        .into_iter()
        .collect()
}
