//! Bounded-concurrency worker pool
//!
//! Runs a batch of fallible async tasks with a fixed concurrency limit and
//! a per-task retry policy, collecting results in the order the tasks were
//! submitted. Attachment fetching and image preparation both run through
//! this; the limit keeps report generation from hammering the database
//! while staying faster than a sequential loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Retry policy applied to each task independently
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,

    /// Base delay before a retry; scales linearly with the attempt number
    pub backoff: Duration,
}

impl RetryPolicy {
    /// No retries; every task gets exactly one attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    /// One retry after a short backoff
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Runs tasks with at most `limit` in flight at once
///
/// Each entry is a factory producing a fresh future per attempt, so a
/// failed task can be retried per `retry`. Results come back in submission
/// order, successes and failures alike; one task failing does not cancel
/// the rest.
///
/// # Panics
///
/// Propagates a panic from any task.
pub async fn run_with_limit<F, Fut, T, E>(
    tasks: Vec<F>,
    limit: usize,
    retry: RetryPolicy,
) -> Vec<Result<T, E>>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let limit = limit.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));

    debug!(tasks = tasks.len(), limit, "Running task batch");

    let handles: Vec<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| {
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                // The semaphore is never closed while workers hold the Arc.
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("worker pool semaphore closed");

                let mut attempt: u32 = 0;
                loop {
                    match task().await {
                        Ok(value) => return Ok(value),
                        Err(error) if attempt < retry.max_retries => {
                            attempt += 1;
                            warn!(index, attempt, %error, "Task failed, retrying");
                            tokio::time::sleep(retry.backoff * attempt).await;
                        }
                        Err(error) => return Err(error),
                    }
                }
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        // JoinError here means the task panicked; surface it.
        results.push(handle.await.expect("worker task panicked"));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_limit_bounds_in_flight_tasks() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..20)
            .map(|i: u32| {
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                move || {
                    let in_flight = Arc::clone(&in_flight);
                    let max_seen = Arc::clone(&max_seen);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<u32, String>(i)
                    }
                }
            })
            .collect();

        let results = run_with_limit(tasks, 3, RetryPolicy::none()).await;

        assert_eq!(results.len(), 20);
        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_preserve_submission_order() {
        // Later tasks finish sooner, so completion order is reversed.
        let tasks: Vec<_> = (0..10)
            .map(|i: u64| {
                move || async move {
                    tokio::time::sleep(Duration::from_millis(100 - i * 10)).await;
                    Ok::<u64, String>(i)
                }
            })
            .collect();

        let results = run_with_limit(tasks, 10, RetryPolicy::none()).await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, (0..10).collect::<Vec<u64>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_transient_failure() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let tasks = vec![move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient".to_string())
                } else {
                    Ok(42u32)
                }
            }
        }];

        let results = run_with_limit(tasks, 1, RetryPolicy::default()).await;

        assert_eq!(results[0].as_ref().unwrap(), &42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let tasks = vec![move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, String>("permanent".to_string())
            }
        }];

        let results = run_with_limit(tasks, 1, RetryPolicy::default()).await;

        assert_eq!(results[0].as_ref().unwrap_err(), "permanent");
        // One initial attempt plus one retry.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_cancel_the_rest() {
        let tasks: Vec<_> = (0..5)
            .map(|i: u32| {
                move || async move {
                    if i == 2 {
                        Err("boom".to_string())
                    } else {
                        Ok(i)
                    }
                }
            })
            .collect();

        let results = run_with_limit(tasks, 2, RetryPolicy::none()).await;

        assert!(results[2].is_err());
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_clamped_to_one() {
        let tasks = vec![|| async { Ok::<u32, String>(1) }];
        let results = run_with_limit(tasks, 0, RetryPolicy::none()).await;
        assert_eq!(results[0].as_ref().unwrap(), &1);
    }
}
