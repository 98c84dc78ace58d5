//! Bootstrap perf-map fetch. Nothing else can run without it, so any failure
//! here is fatal to the whole run.

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use super::{DomainTarget, PopTarget, ANALYTICS_DOMAIN};
use crate::client::{ClientToken, ProbeClient};
use crate::error::DiagError;
use crate::extract;

/// Run configuration handed out by the bootstrap endpoint: client geo info
/// plus the candidate PoPs and domains to probe.
#[derive(Debug, Deserialize)]
pub struct PerfMap {
    pub geo_ip: Value,
    pub pops: Vec<PopTarget>,
    pub domains: Vec<DomainTarget>,
}

pub async fn fetch(client: &ProbeClient, token: &ClientToken) -> Result<PerfMap, DiagError> {
    let hostname = format!("{}-perfmap.{}", token, ANALYTICS_DOMAIN);
    let response = client
        .fetch(&hostname, "/perfmapconfig.js?jsonp=FASTLY.setupPerfmap", Method::GET)
        .await?
        .ensure_success(&hostname)?;

    let value = extract::unwrap_jsonp(&response.body)?;
    tracing::debug!(perfmap = %value, "perf map payload");
    Ok(serde_json::from_value(value)?)
}
