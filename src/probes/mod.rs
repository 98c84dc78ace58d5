//! Probe modules: perf-map bootstrap, resolver identity, PoP assignment,
//! latency scoring, and bandwidth estimation.

pub mod bandwidth;
pub mod latency;
pub mod perfmap;
pub mod pops;
pub mod resolver;

use serde::Deserialize;

/// The only hardcoded endpoint host; everything else comes from the perf map.
pub const BOOTSTRAP_HOST: &str = "www.fastly-debug.com";

/// Analytics domain that token-prefixed probe hostnames hang off.
pub const ANALYTICS_DOMAIN: &str = "fastly-analytics.com";

/// Candidate PoP to latency-test, as listed by the perf map.
#[derive(Debug, Clone, Deserialize)]
pub struct PopTarget {
    pub hostname: String,
    #[serde(rename = "popId")]
    pub pop_id: String,
}

/// Hostname whose PoP assignment should be resolved, tagged with the logical
/// resolution type it represents.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainTarget {
    pub hostname: String,
    #[serde(rename = "type")]
    pub kind: String,
}
