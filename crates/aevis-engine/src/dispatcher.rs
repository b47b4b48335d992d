//! Concurrent fan-out of the `queries × platforms` probe matrix.
//!
//! Every pair is an independent task; tasks run under a bounded concurrency
//! cap with no ordering guarantee and no cross-task cancellation. The matrix
//! is collected fully before aggregation (fan-out/fan-in), so no shared
//! mutable state exists anywhere in the run.

use aevis_core::PlatformSpec;
use futures::stream::{self, StreamExt};

use crate::error::EngineError;
use crate::prober::{probe, ProbeContext};
use crate::types::{ProbeResult, Query};

/// Probes every `(query, platform)` pair and returns one [`ProbeResult`] per
/// slot: success or captured error, never a dropped task.
///
/// `max_concurrent` bounds in-flight probes to respect provider rate limits.
///
/// # Errors
///
/// Returns [`EngineError::NoPlatforms`] for an empty platform set, and
/// [`EngineError::AllPlatformsFailed`] when every slot across every platform
/// errored (the systemic-outage case). Partial failure (even a whole platform
/// down) is not an error; it surfaces through the per-platform error counts.
pub async fn dispatch(
    ctx: ProbeContext<'_>,
    queries: &[Query],
    platforms: &[PlatformSpec],
    max_concurrent: usize,
) -> Result<Vec<ProbeResult>, EngineError> {
    if platforms.is_empty() {
        return Err(EngineError::NoPlatforms);
    }

    let pairs: Vec<(&Query, &PlatformSpec)> = queries
        .iter()
        .flat_map(|q| platforms.iter().map(move |p| (q, p)))
        .collect();

    tracing::info!(
        queries = queries.len(),
        platforms = platforms.len(),
        slots = pairs.len(),
        max_concurrent,
        "dispatching probe matrix"
    );

    let results: Vec<ProbeResult> = stream::iter(pairs)
        .map(|(query, platform)| probe(ctx, query, platform))
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    if !results.is_empty() && results.iter().all(ProbeResult::is_error) {
        return Err(EngineError::AllPlatformsFailed {
            attempted: results.len(),
        });
    }

    let errored = results.iter().filter(|r| r.is_error()).count();
    if errored > 0 {
        tracing::warn!(
            errored,
            total = results.len(),
            "some probe slots failed"
        );
    }

    Ok(results)
}
