//! Resolver/identity probe: who resolved us, who we are, and what the edge
//! sees of the active connection. Dominates the deliverable, so failure here
//! is fatal to the run.

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use trust_dns_resolver::TokioAsyncResolver;

use super::{bandwidth, ANALYTICS_DOMAIN, BOOTSTRAP_HOST};
use crate::client::{ClientToken, ProbeClient, ACCEPT_LANGUAGE_VALUE, USER_AGENT};
use crate::error::DiagError;
use crate::extract;
use crate::report::{RequestInfo, ResolverInfo};

/// Identity block as the debug_resolver endpoint shapes it.
#[derive(Debug, Default, Deserialize)]
struct RawIdentity {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    as_name: String,
    #[serde(default)]
    as_number: u32,
    #[serde(default)]
    cc: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawResolver {
    #[serde(default)]
    dns_resolver_info: RawIdentity,
    #[serde(default)]
    client_ip_info: RawIdentity,
}

fn parse_resolver(value: Value) -> ResolverInfo {
    // Leniency: missing sub-objects or fields collapse to empty/zero rather
    // than failing the probe (mirrors the legacy empty-result behavior).
    let raw: RawResolver = serde_json::from_value(value).unwrap_or_default();
    ResolverInfo {
        resolver_ip: raw.dns_resolver_info.ip,
        resolver_as_name: raw.dns_resolver_info.as_name,
        resolver_as_number: raw.dns_resolver_info.as_number,
        resolver_country_code: raw.dns_resolver_info.cc,
        client_ip: raw.client_ip_info.ip,
        client_as_name: raw.client_ip_info.as_name,
        client_as_number: raw.client_ip_info.as_number,
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawTcpInfo {
    #[serde(default)]
    cwnd: i64,
    #[serde(default)]
    nexthop: String,
    /// Microseconds upstream.
    #[serde(default)]
    rtt: f64,
    #[serde(default)]
    delta_retrans: i64,
    #[serde(default)]
    total_retrans: i64,
}

struct TcpStats {
    cwnd: i64,
    nexthop: String,
    rtt_ms: f64,
    delta_retrans: i64,
    total_retrans: i64,
}

fn parse_tcpinfo(value: Value) -> TcpStats {
    let raw: RawTcpInfo = serde_json::from_value(value).unwrap_or_default();
    TcpStats {
        cwnd: raw.cwnd,
        nexthop: raw.nexthop,
        rtt_ms: raw.rtt / 1000.0,
        delta_retrans: raw.delta_retrans,
        total_retrans: raw.total_retrans,
    }
}

async fn resolve_server_ip(host: &str) -> Result<String, DiagError> {
    let resolver =
        TokioAsyncResolver::tokio_from_system_conf().map_err(|e| DiagError::Resolve {
            host: host.to_string(),
            detail: e.to_string(),
        })?;
    let lookup = resolver.lookup_ip(host).await.map_err(|e| DiagError::Resolve {
        host: host.to_string(),
        detail: e.to_string(),
    })?;
    lookup
        .iter()
        .next()
        .map(|ip| ip.to_string())
        .ok_or_else(|| DiagError::Resolve {
            host: host.to_string(),
            detail: "no addresses returned".to_string(),
        })
}

/// Assemble the full request-info block: resolver identity, bootstrap page
/// scrape, TCP statistics, server address, and the bandwidth estimate.
pub async fn collect(client: &ProbeClient, token: &ClientToken) -> Result<RequestInfo, DiagError> {
    let time = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let resolver_host = format!("{}.u.{}", token, ANALYTICS_DOMAIN);
    let identity = client
        .fetch(&resolver_host, "/debug_resolver", Method::GET)
        .await?;
    let resolver = parse_resolver(extract::lenient_json(identity.status, &identity.body));

    // The bootstrap root page carries the XFF cell and the serving cache in
    // its headers.
    let root = client
        .fetch(BOOTSTRAP_HOST, "/", Method::GET)
        .await?
        .ensure_success(BOOTSTRAP_HOST)?;
    let xff = extract::extract_xff(&root.body)?;
    let datacenter = extract::extract_datacenter(&root.headers)?;

    let tcpinfo = client.fetch(BOOTSTRAP_HOST, "/tcpinfo", Method::GET).await?;
    let tcp = parse_tcpinfo(extract::lenient_json(tcpinfo.status, &tcpinfo.body));

    let server_ip = resolve_server_ip(BOOTSTRAP_HOST).await?;
    let bandwidth_mbps = bandwidth::estimate(client, token).await?;

    Ok(RequestInfo {
        resolver,
        time,
        host: BOOTSTRAP_HOST.to_string(),
        accept: "*/*".to_string(),
        user_agent: USER_AGENT.to_string(),
        acceptlanguage: ACCEPT_LANGUAGE_VALUE.to_string(),
        acceptencoding: "gzip".to_string(),
        server_ip,
        xff,
        datacenter,
        bandwidth_mbps,
        cwnd: tcp.cwnd,
        nexthop: tcp.nexthop,
        rtt: tcp.rtt_ms,
        delta_retrans: tcp.delta_retrans,
        total_retrans: tcp.total_retrans,
    })
}
