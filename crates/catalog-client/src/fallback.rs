//! Retry, timeout and fallback-to-empty, independent of transport.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::RetryPolicy;

/// How a guarded fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// The operation produced a value.
    Found(T),
    /// The operation reported that the value does not exist.
    NotFound,
    /// Every attempt failed.
    Exhausted,
    /// The ceiling elapsed before the operation settled.
    TimedOut,
}

impl<T> FetchOutcome<T> {
    /// Collapses the outcome to the value, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Label used for logs and the `outcome` metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Found(_) => "found",
            FetchOutcome::NotFound => "not_found",
            FetchOutcome::Exhausted => "exhausted",
            FetchOutcome::TimedOut => "timed_out",
        }
    }
}

/// Runs `op` under `policy`, guarded by a single `timeout` for all attempts.
///
/// `Ok(Some)` and `Ok(None)` end the loop immediately. `Err` is retried after
/// a backoff until `policy.max_attempts` calls have been made.
pub async fn fetch_with_fallback<T, E, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    mut op: F,
) -> FetchOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    let attempts = async {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(Some(value)) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "catalog lookup succeeded after retry");
                    }
                    return FetchOutcome::Found(value);
                }
                Ok(None) => return FetchOutcome::NotFound,
                Err(err) => {
                    if attempt >= policy.max_attempts {
                        tracing::warn!(attempt, error = %err, "catalog lookup retries exhausted");
                        return FetchOutcome::Exhausted;
                    }

                    let backoff = policy.backoff_after(attempt);
                    tracing::debug!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "catalog lookup failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    };

    match tokio::time::timeout(timeout, attempts).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "catalog lookup timed out");
            FetchOutcome::TimedOut
        }
    }
}

/// Like [`fetch_with_fallback`], collapsed to an `Option`.
pub async fn fetch_or_empty<T, E, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    fetch_with_fallback(policy, timeout, op)
        .await
        .into_option()
}

pub(crate) fn record_lookup<T>(outcome: &FetchOutcome<T>) {
    metrics::counter!("catalog_lookups_total", "outcome" => outcome.label()).increment(1);
}
