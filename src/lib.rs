//! fastly-debug -- edge network-path diagnostics for CDN support cases.
//!
//! One best-effort measurement pass per invocation: which resolver and PoP
//! serve this client, latency scores against candidate PoPs, a rough
//! downstream bandwidth figure, and TCP statistics from the edge's side of
//! the connection, folded into a single encoded report.

pub mod client;
pub mod error;
pub mod extract;
pub mod output;
pub mod probes;
pub mod report;

use anyhow::{Context, Result};

use client::{ClientToken, ProbeClient};
use report::DiagnosticReport;

/// Run the full measurement pipeline and aggregate the report.
///
/// The perf-map fetch and the resolver/identity probe are fatal on failure;
/// the latency and PoP-assignment batches tolerate individual target
/// failures and return whatever they measured.
pub async fn collect_report(debug: bool) -> Result<DiagnosticReport> {
    let token = ClientToken::generate();
    tracing::info!(token = %token, "starting diagnostic run");

    let client = ProbeClient::new(debug).context("building HTTP client")?;

    let perfmap = probes::perfmap::fetch(&client, &token)
        .await
        .context("fetching bootstrap perf map")?;
    tracing::info!(
        pops = perfmap.pops.len(),
        domains = perfmap.domains.len(),
        "perf map loaded"
    );

    let pop_latency = probes::latency::measure_all(&client, &token, &perfmap.pops).await;
    let pop_assignments = probes::pops::assign_all(&client, &token, &perfmap.domains).await;

    let request = probes::resolver::collect(&client, &token)
        .await
        .context("resolver/identity probe")?;

    Ok(DiagnosticReport {
        geoip: perfmap.geo_ip,
        pop_latency,
        pop_assignments,
        request,
    })
}
