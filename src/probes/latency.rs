//! Latency probe: times a small test-object fetch against each candidate PoP.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;

use super::PopTarget;
use crate::client::{Checkpoint, ClientToken, ProbeClient};
use crate::error::DiagError;

/// Convert a body-transfer duration into the dimensionless latency score.
///
/// Seconds scaled by 100, truncated toward zero. An ad hoc score kept
/// exactly for compatibility with existing support tooling, not a calibrated
/// millisecond value.
pub fn latency_score(duration: Duration) -> i64 {
    (duration.as_secs_f64() * 100.0) as i64
}

async fn probe_pop(
    client: &ProbeClient,
    token: &ClientToken,
    target: &PopTarget,
) -> Result<Duration, DiagError> {
    let path = format!(
        "/testobject.svg?unique={}-perfmap&popId={}",
        token, target.pop_id
    );
    let response = client
        .fetch(&target.hostname, &path, Method::GET)
        .await?
        .ensure_success(&target.hostname)?;

    let timing = response.timing;
    if let (Some(total), Some(ttfb)) = (
        timing.between(Checkpoint::Start, Checkpoint::End),
        timing.between(Checkpoint::Start, Checkpoint::Response),
    ) {
        tracing::debug!(
            pop = %target.pop_id,
            total_s = total.as_secs_f64(),
            ttfb_s = ttfb.as_secs_f64(),
            "latency probe timings"
        );
    }

    // Response-to-End isolates body transfer from connection setup and TTFB.
    timing
        .between(Checkpoint::Response, Checkpoint::End)
        .ok_or(DiagError::MarkerNotFound { marker: "response" })
}

/// Score every candidate PoP. Probes run one at a time: parallel transfers
/// would contend for the path and bias the very durations being measured.
/// A failed target is logged and skipped.
pub async fn measure_all(
    client: &ProbeClient,
    token: &ClientToken,
    targets: &[PopTarget],
) -> BTreeMap<String, i64> {
    let mut latencies = BTreeMap::new();
    for target in targets {
        match probe_pop(client, token, target).await {
            Ok(duration) => {
                latencies.insert(target.pop_id.clone(), latency_score(duration));
            }
            Err(err) => {
                tracing::warn!(pop = %target.pop_id, error = %err, "latency probe failed; continuing");
            }
        }
    }
    latencies
}
