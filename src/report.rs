//! The aggregated diagnostic report.
//!
//! Field names follow the upstream service contract (the report is consumed
//! by support tooling), so several keys keep their legacy spelling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resolver and client identity as seen by the edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolverInfo {
    pub resolver_ip: String,
    pub resolver_as_name: String,
    pub resolver_as_number: u32,
    pub resolver_country_code: String,
    pub client_ip: String,
    pub client_as_name: String,
    pub client_as_number: u32,
}

/// Request-level block: identity, scrape results, bandwidth estimate, and
/// TCP statistics for the active connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestInfo {
    #[serde(flatten)]
    pub resolver: ResolverInfo,

    /// Run timestamp, UTC, `%Y-%m-%dT%H:%M:%SZ`.
    pub time: String,
    pub host: String,
    pub accept: String,
    #[serde(rename = "user-agent")]
    pub user_agent: String,
    pub acceptlanguage: String,
    pub acceptencoding: String,

    /// Bootstrap host address from ordinary hostname resolution.
    pub server_ip: String,
    pub xff: String,
    pub datacenter: String,
    pub bandwidth_mbps: f64,

    pub cwnd: i64,
    pub nexthop: String,
    /// Round-trip time in milliseconds (upstream reports microseconds).
    pub rtt: f64,
    pub delta_retrans: i64,
    pub total_retrans: i64,
}

/// One full diagnostic run, serialized as the support payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticReport {
    pub geoip: Value,
    #[serde(rename = "popLatency")]
    pub pop_latency: BTreeMap<String, i64>,
    #[serde(rename = "popAssignments")]
    pub pop_assignments: BTreeMap<String, String>,
    pub request: RequestInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> DiagnosticReport {
        DiagnosticReport {
            geoip: json!({"cc": "US", "city": "san jose"}),
            pop_latency: BTreeMap::from([("SJC".to_string(), 12), ("LHR".to_string(), 48)]),
            pop_assignments: BTreeMap::from([("ac".to_string(), "SJC".to_string())]),
            request: RequestInfo {
                resolver: ResolverInfo {
                    resolver_ip: "203.0.113.53".into(),
                    resolver_as_name: "example dns".into(),
                    resolver_as_number: 64496,
                    resolver_country_code: "US".into(),
                    client_ip: "198.51.100.9".into(),
                    client_as_name: "example isp".into(),
                    client_as_number: 64511,
                },
                time: "2026-08-27T12:00:00Z".into(),
                host: "www.fastly-debug.com".into(),
                accept: "*/*".into(),
                user_agent: "Fastly-Debug-CLI 0.1.0".into(),
                acceptlanguage: "en-US".into(),
                acceptencoding: "gzip".into(),
                server_ip: "151.101.1.57".into(),
                xff: "198.51.100.9".into(),
                datacenter: "SJC".into(),
                bandwidth_mbps: 87.4,
                cwnd: 10,
                nexthop: "203.0.113.1".into(),
                rtt: 14.2,
                delta_retrans: 0,
                total_retrans: 3,
            },
        }
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = sample_report();
        let encoded = serde_json::to_string_pretty(&report).unwrap();
        let decoded: DiagnosticReport = serde_json::from_str(&encoded).unwrap();
        assert_eq!(report, decoded);
    }

    #[test]
    fn report_uses_legacy_key_spellings() {
        let value = serde_json::to_value(sample_report()).unwrap();
        assert!(value.get("popLatency").is_some());
        assert!(value.get("popAssignments").is_some());
        assert!(value["request"].get("user-agent").is_some());
        // resolver block is flattened into request
        assert_eq!(value["request"]["resolver_ip"], "203.0.113.53");
    }
}
