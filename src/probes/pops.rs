//! PoP assignment probe: which edge PoP each perf-map domain was routed to.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use reqwest::Method;

use super::DomainTarget;
use crate::client::{ClientToken, ProbeClient};
use crate::error::DiagError;
use crate::extract;

/// Assignment lookups are timing-insensitive, so a small pool is safe.
const ASSIGNMENT_CONCURRENCY: usize = 4;

async fn fetch_popname(
    client: &ProbeClient,
    token: &ClientToken,
    target: &DomainTarget,
) -> Result<String, DiagError> {
    let path = format!("/popname.js?jsonp=fastly.setPopName&unique={}", token);
    let response = client
        .fetch(&target.hostname, &path, Method::GET)
        .await?
        .ensure_success(&target.hostname)?;

    let value = extract::unwrap_jsonp(&response.body)?;
    tracing::debug!(host = %target.hostname, payload = %value, "popname payload");

    value
        .get("popname")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(DiagError::MarkerNotFound { marker: "popname" })
}

/// Resolve PoP assignments for all targets, bounded-concurrently.
///
/// One target failing must not sink the rest: failures are logged and
/// dropped, and whatever succeeded is returned.
pub async fn assign_all(
    client: &ProbeClient,
    token: &ClientToken,
    targets: &[DomainTarget],
) -> BTreeMap<String, String> {
    let results: Vec<(String, Result<String, DiagError>)> = stream::iter(targets)
        .map(|target| async move {
            (
                target.kind.clone(),
                fetch_popname(client, token, target).await,
            )
        })
        .buffer_unordered(ASSIGNMENT_CONCURRENCY)
        .collect()
        .await;

    fold_assignments(results)
}

fn fold_assignments(
    results: Vec<(String, Result<String, DiagError>)>,
) -> BTreeMap<String, String> {
    let mut assignments = BTreeMap::new();
    for (kind, result) in results {
        match result {
            Ok(popname) => {
                assignments.insert(kind, popname);
            }
            Err(err) => {
                tracing::warn!(%kind, error = %err, "pop assignment failed; continuing");
            }
        }
    }
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_failed_target_does_not_sink_the_batch() {
        let results: Vec<(String, Result<String, DiagError>)> = vec![
            ("ac".to_string(), Ok("SJC".to_string())),
            ("a".to_string(), Err(DiagError::JsonpEnvelope)),
            ("cname".to_string(), Ok("LHR".to_string())),
        ];

        let assignments = fold_assignments(results);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments["ac"], "SJC");
        assert_eq!(assignments["cname"], "LHR");
        assert!(!assignments.contains_key("a"));
    }

    #[test]
    fn empty_batch_yields_empty_map() {
        assert!(fold_assignments(Vec::new()).is_empty());
    }
}
