use std::time::Instant;

use futures_util::{future, stream, StreamExt};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ValidationError;

use super::{
    models::{BatchMode, BatchOptions, BatchRun, Progress, RequestSpec},
    runner::RequestExecutor,
};

pub const MAX_BATCH_COUNT: u32 = 1000;

/// A request count within `1..=MAX_BATCH_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BatchCount(u32);

impl BatchCount {
    pub const ONE: BatchCount = BatchCount(1);

    pub fn new(count: u32) -> Result<Self, ValidationError> {
        if (1..=MAX_BATCH_COUNT).contains(&count) {
            Ok(Self(count))
        } else {
            Err(ValidationError::CountOutOfRange {
                count,
                max: MAX_BATCH_COUNT,
            })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for BatchCount {
    type Error = ValidationError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("batch cancelled before any request completed")]
    Cancelled,
}

/// Sends `spec` `count` times. The count is checked before anything goes
/// out. Progress is reported after each completed request when
/// `count > 1`. The cancel flag is checked before each request is issued;
/// an in-flight request is always allowed to finish.
pub async fn run_batch<F>(
    executor: &RequestExecutor,
    spec: &RequestSpec,
    count: u32,
    options: &BatchOptions,
    mut on_progress: F,
) -> Result<BatchRun, BatchError>
where
    F: FnMut(Progress),
{
    let total = BatchCount::new(count)?.get();
    let mut results = Vec::with_capacity(total as usize);
    let mut report = |completed: u32| {
        if total > 1 {
            on_progress(Progress { completed, total });
        }
    };

    debug!(count = total, mode = ?options.mode, url = %spec.url, "starting batch");
    let start = Instant::now();

    match options.mode {
        BatchMode::Sequential => {
            for number in 1..=total {
                if options.is_cancelled() {
                    break;
                }
                results.push(executor.execute(spec, number).await);
                report(number);
            }
        }
        BatchMode::Concurrent { limit } => {
            let mut in_flight = stream::iter(1..=total)
                .take_while(|_| future::ready(!options.is_cancelled()))
                .map(|number| executor.execute(spec, number))
                .buffered(limit.max(1));
            while let Some(result) = in_flight.next().await {
                results.push(result);
                report(results.len() as u32);
            }
        }
    }

    let total_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let cancelled = results.len() < total as usize;

    if results.is_empty() {
        return Err(BatchError::Cancelled);
    }

    info!(
        requested = total,
        completed = results.len(),
        succeeded = results.iter().filter(|r| r.success).count(),
        total_time_ms,
        cancelled,
        "batch finished"
    );

    Ok(BatchRun {
        results,
        total_time_ms,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;
    use crate::executor::testing::{ScriptedTransport, Step};
    use crate::route::HttpMethod;

    fn setup(steps: Vec<Step>) -> (RequestExecutor, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(steps));
        (RequestExecutor::new(transport.clone()), transport)
    }

    fn spec() -> RequestSpec {
        RequestSpec::new(HttpMethod::Get, "http://x/items")
    }

    #[test]
    fn count_bounds() {
        assert!(BatchCount::new(0).is_err());
        assert_eq!(BatchCount::new(1).unwrap(), BatchCount::ONE);
        assert_eq!(BatchCount::try_from(1000).unwrap().get(), 1000);
        assert_eq!(
            BatchCount::new(1001).unwrap_err(),
            ValidationError::CountOutOfRange {
                count: 1001,
                max: 1000
            }
        );
    }

    #[tokio::test]
    async fn out_of_range_counts_send_nothing() {
        let (executor, transport) = setup(vec![]);
        for count in [0, 1001] {
            let err = run_batch(&executor, &spec(), count, &BatchOptions::default(), |_| {})
                .await
                .unwrap_err();
            assert!(matches!(err, BatchError::Validation(_)));
        }
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn sequential_requests_never_overlap() {
        let (executor, transport) = setup(vec![
            Step::delayed(60),
            Step::delayed(30),
            Step::delayed(5),
        ]);
        let run = run_batch(&executor, &spec(), 3, &BatchOptions::default(), |_| {})
            .await
            .unwrap();

        let numbers: Vec<_> = run.results.iter().map(|r| r.request_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].started >= pair[0].finished);
        }

        let slowest = run.results.iter().map(|r| r.response_time_ms).max().unwrap();
        assert!(run.total_time_ms >= slowest);
        assert!(run.results[0].response_time_ms >= 60);
        assert!(!run.cancelled);
    }

    #[tokio::test]
    async fn transport_failure_does_not_stop_the_batch() {
        let (executor, transport) = setup(vec![
            Step::json(200, "{}"),
            Step::Fail("connection reset"),
            Step::json(200, "{}"),
        ]);
        let run = run_batch(&executor, &spec(), 3, &BatchOptions::default(), |_| {})
            .await
            .unwrap();

        assert_eq!(run.results.len(), 3);
        assert!(run.results[0].success);
        assert!(!run.results[1].success);
        assert_eq!(run.results[1].status, 0);
        assert!(run.results[2].success);
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn progress_is_reported_for_batches_only() {
        let (executor, _) = setup(vec![]);
        let mut seen = Vec::new();
        run_batch(&executor, &spec(), 3, &BatchOptions::default(), |p| seen.push(p))
            .await
            .unwrap();
        assert_eq!(
            seen,
            vec![
                Progress { completed: 1, total: 3 },
                Progress { completed: 2, total: 3 },
                Progress { completed: 3, total: 3 },
            ]
        );

        let mut single = Vec::new();
        run_batch(&executor, &spec(), 1, &BatchOptions::default(), |p| single.push(p))
            .await
            .unwrap();
        assert!(single.is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_between_requests() {
        let (executor, transport) = setup(vec![]);
        let flag = Arc::new(AtomicBool::new(false));
        let options = BatchOptions::sequential().with_cancel(flag.clone());

        let run = run_batch(&executor, &spec(), 10, &options, |p| {
            if p.completed == 2 {
                flag.store(true, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();

        assert_eq!(run.results.len(), 2);
        assert!(run.cancelled);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_cancellation_drains_in_flight_requests() {
        let (executor, transport) = setup(vec![]);
        let flag = Arc::new(AtomicBool::new(false));
        let options = BatchOptions::default()
            .with_mode(BatchMode::Concurrent { limit: 2 })
            .with_cancel(flag.clone());

        let run = run_batch(&executor, &spec(), 10, &options, |p| {
            if p.completed == 1 {
                flag.store(true, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();

        let numbers: Vec<_> = run.results.iter().map(|r| r.request_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(run.cancelled);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_is_an_error() {
        let (executor, transport) = setup(vec![]);
        let options = BatchOptions::sequential().with_cancel(Arc::new(AtomicBool::new(true)));
        let err = run_batch(&executor, &spec(), 3, &options, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, BatchError::Cancelled);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn concurrent_mode_preserves_issue_order() {
        let (executor, transport) = setup(vec![
            Step::delayed(80),
            Step::delayed(40),
            Step::delayed(5),
            Step::delayed(5),
        ]);
        let options = BatchOptions::default().with_mode(BatchMode::Concurrent { limit: 4 });
        let run = run_batch(&executor, &spec(), 4, &options, |_| {})
            .await
            .unwrap();

        let numbers: Vec<_> = run.results.iter().map(|r| r.request_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(transport.calls().len(), 4);
    }
}
