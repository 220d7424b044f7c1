//! Cancellable poll-until-terminal primitive.
//!
//! Both wait phases of the workflow (change-set materialization and
//! execution) are the same shape: fetch a status snapshot on a fixed
//! interval until a caller-supplied classifier declares it terminal, while
//! racing an external cancellation signal. This module provides that loop
//! once, generically.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Result, StackPilotError};

/// Interval between status fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Classification of one fetched snapshot.
#[derive(Debug)]
pub enum Tick<T> {
    /// Not terminal yet; keep polling.
    Continue,
    /// Terminal success; the loop returns this value.
    Done(T),
    /// Terminal failure; the loop returns this error.
    Fail(StackPilotError),
}

/// Polls `fetch` every `interval` until `classify` declares the snapshot
/// terminal, racing `cancel` at every suspend point.
///
/// The first fetch happens after one full interval, and the wait is a
/// cooperative suspension, not a busy spin.
///
/// # Errors
///
/// Returns [`StackPilotError::Cancelled`] if the cancellation signal fires
/// before a terminal classification, a fetch error verbatim (transport
/// errors are never conflated with remote-reported terminal failures), or
/// the classifier's failure.
pub async fn poll_until<S, T, Fetch, FetchFut, Classify>(
    interval: Duration,
    cancel: &CancellationToken,
    mut fetch: Fetch,
    mut classify: Classify,
) -> Result<T>
where
    Fetch: FnMut() -> FetchFut,
    FetchFut: Future<Output = Result<S>>,
    Classify: FnMut(&S) -> Tick<T>,
{
    loop {
        tokio::select! {
            () = cancel.cancelled() => return Err(StackPilotError::Cancelled),
            () = tokio::time::sleep(interval) => {}
        }

        let snapshot = tokio::select! {
            () = cancel.cancelled() => return Err(StackPilotError::Cancelled),
            result = fetch() => result?,
        };

        match classify(&snapshot) {
            Tick::Continue => {}
            Tick::Done(value) => return Ok(value),
            Tick::Fail(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Phase, RemoteError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn statuses(seq: &'static [&'static str]) -> impl FnMut() -> std::future::Ready<Result<String>> {
        let calls = Arc::new(AtomicUsize::new(0));
        move || {
            let i = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(seq[i.min(seq.len() - 1)].to_string()))
        }
    }

    fn classify_create(status: &String) -> Tick<()> {
        match status.as_str() {
            "pending" => Tick::Continue,
            "complete" => Tick::Done(()),
            other => Tick::Fail(
                RemoteError::UnexpectedStatus {
                    phase: Phase::DescribeChangeSet,
                    status: other.to_string(),
                }
                .into(),
            ),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_continues_until_terminal_then_stops() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);
        let cancel = CancellationToken::new();

        let mut seq = statuses(&["pending", "pending", "complete"]);
        poll_until(
            POLL_INTERVAL,
            &cancel,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                seq()
            },
            classify_create,
        )
        .await
        .unwrap();

        // Terminal classification returns exactly once, after the two
        // non-terminal snapshots.
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_a_full_interval_before_first_fetch() {
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        poll_until(
            POLL_INTERVAL,
            &cancel,
            statuses(&["complete"]),
            classify_create,
        )
        .await
        .unwrap();

        assert!(start.elapsed() >= POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_failure_propagates() {
        let cancel = CancellationToken::new();

        let err = poll_until(
            POLL_INTERVAL,
            &cancel,
            statuses(&["pending", "boom"]),
            classify_create,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StackPilotError::Remote(RemoteError::UnexpectedStatus { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_distinct_from_terminal_failure() {
        let cancel = CancellationToken::new();

        let err = poll_until(
            POLL_INTERVAL,
            &cancel,
            || {
                std::future::ready(Err::<String, _>(
                    RemoteError::call(Phase::DescribeChangeSet, "connection reset").into(),
                ))
            },
            classify_create,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StackPilotError::Remote(RemoteError::CallFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_before_terminal() {
        let cancel = CancellationToken::new();
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);
        let stop_after = 5;

        let token = cancel.clone();
        let err = poll_until(
            POLL_INTERVAL,
            &cancel,
            move || {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 == stop_after {
                    token.cancel();
                }
                std::future::ready(Ok(String::from("pending")))
            },
            classify_create,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StackPilotError::Cancelled));
        // The same non-terminal status never transitioned state on its own.
        assert_eq!(fetches.load(Ordering::SeqCst), stop_after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_never_fetches() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poll_until(
            POLL_INTERVAL,
            &cancel,
            || std::future::ready(Ok(String::from("pending"))),
            classify_create,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StackPilotError::Cancelled));
    }
}
