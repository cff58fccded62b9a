//! Batch summary statistics.

use crate::outcome::{BatchStatistics, SingleResult};

/// Summarises a batch. `None` for an empty slice.
///
/// The mean is rounded half-up (`2.5` becomes `3`); min and max are exact.
pub fn aggregate(results: &[SingleResult], total_time_ms: u64) -> Option<BatchStatistics> {
    let total = u32::try_from(results.len()).ok().filter(|n| *n > 0)?;
    let successful = results.iter().filter(|r| r.success).count() as u32;

    let times = results.iter().map(|r| r.response_time_ms);
    let min = times.clone().min()?;
    let max = times.clone().max()?;
    let sum: u128 = times.map(u128::from).sum();
    let count = u128::from(total);
    let avg = (sum + count / 2) / count;

    Some(BatchStatistics {
        total_requests: total,
        successful_requests: successful,
        failed_requests: total - successful,
        total_time_ms,
        avg_response_time_ms: avg as u64,
        min_response_time_ms: min,
        max_response_time_ms: max,
    })
}
