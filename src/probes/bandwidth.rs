//! Downstream bandwidth estimate from two timed fetches: a near-empty
//! baseline response to measure connection overhead, then a payload object.

use std::time::Duration;

use reqwest::header::CONTENT_LENGTH;
use reqwest::Method;

use super::{ANALYTICS_DOMAIN, BOOTSTRAP_HOST};
use crate::client::{Checkpoint, ClientToken, ProbeClient, ProbeResponse};
use crate::error::DiagError;

/// Derive Mbps from a payload size and the two raw fetch durations.
///
/// Transfer time is `total - overhead`, except when the payload fetch came
/// back faster than the baseline (pathological but observed); then the full
/// payload duration is used so the estimate can never go negative. A transfer
/// time of exactly zero is an explicit error, never an Inf/NaN estimate.
pub fn estimate_mbps(
    content_length: u64,
    total: Duration,
    overhead: Duration,
) -> Result<f64, DiagError> {
    let transfer = if total <= overhead {
        total
    } else {
        total - overhead
    };

    let secs = transfer.as_secs_f64();
    if secs == 0.0 {
        return Err(DiagError::ZeroTransferTime);
    }

    Ok((content_length as f64 * 8.0) / secs / 1_000_000.0)
}

fn full_duration(response: &ProbeResponse) -> Result<Duration, DiagError> {
    response
        .timing
        .between(Checkpoint::Start, Checkpoint::End)
        .ok_or(DiagError::MarkerNotFound { marker: "end" })
}

/// Run the two timed fetches and compute the estimate.
pub async fn estimate(client: &ProbeClient, token: &ClientToken) -> Result<f64, DiagError> {
    // Baseline: 204 with no body, so its duration is pure connection/TLS
    // overhead for this path.
    let baseline_host = format!("{}.{}", token, ANALYTICS_DOMAIN);
    let baseline = client
        .fetch(&baseline_host, "/generate_204", Method::GET)
        .await?
        .ensure_success(&baseline_host)?;
    let overhead = full_duration(&baseline)?;

    let payload = client
        .fetch(BOOTSTRAP_HOST, "/speedtest", Method::GET)
        .await?
        .ensure_success(BOOTSTRAP_HOST)?;
    let total = full_duration(&payload)?;

    let content_length: u64 = payload
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or(DiagError::MissingContentLength)?;

    let mbps = estimate_mbps(content_length, total, overhead)?;
    tracing::debug!(
        content_length,
        overhead_s = overhead.as_secs_f64(),
        total_s = total.as_secs_f64(),
        mbps,
        "bandwidth estimate"
    );
    Ok(mbps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_megabyte_in_one_second_is_eight_mbps() {
        let mbps = estimate_mbps(
            1_000_000,
            Duration::from_secs_f64(1.05),
            Duration::from_secs_f64(0.05),
        )
        .unwrap();
        assert!((mbps - 8.0).abs() < 1e-9);
    }

    #[test]
    fn payload_faster_than_baseline_falls_back_to_full_duration() {
        // transfer = 0.03s, not -0.02s
        let mbps = estimate_mbps(
            300_000,
            Duration::from_secs_f64(0.03),
            Duration::from_secs_f64(0.05),
        )
        .unwrap();
        assert!((mbps - 80.0).abs() < 1e-9);
        assert!(mbps >= 0.0);
    }

    #[test]
    fn zero_transfer_time_is_an_explicit_error() {
        assert!(matches!(
            estimate_mbps(1_000_000, Duration::ZERO, Duration::ZERO),
            Err(DiagError::ZeroTransferTime)
        ));
    }

    #[test]
    fn estimate_is_never_negative() {
        for (total_ms, overhead_ms) in [(10u64, 200u64), (200, 10), (50, 50)] {
            let mbps = estimate_mbps(
                64_000,
                Duration::from_millis(total_ms),
                Duration::from_millis(overhead_ms),
            )
            .unwrap();
            assert!(mbps >= 0.0);
        }
    }
}
