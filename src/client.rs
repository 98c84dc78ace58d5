//! Timed HTTP probe client.
//!
//! Every network measurement in this crate goes through [`ProbeClient::fetch`],
//! which records wall-clock checkpoints around a single request. No retries:
//! a failed request is the caller's problem to interpret.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, ACCEPT_LANGUAGE};
use reqwest::{Method, StatusCode};
use uuid::Uuid;

use crate::error::DiagError;

/// Per-probe timeout. An unresponsive edge would otherwise hang the run.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub const USER_AGENT: &str = concat!("Fastly-Debug-CLI ", env!("CARGO_PKG_VERSION"));
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US";

/// Opaque per-run identifier, embedded into hostnames and query strings to
/// defeat DNS/HTTP caching and correlate probes server-side. Generated once
/// by the caller and threaded through every probe.
#[derive(Debug, Clone)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named instants recorded during one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Immediately before the request is sent.
    Start,
    /// Status line and headers available.
    Response,
    /// Body fully read.
    End,
}

/// Ordered checkpoint timestamps owned by a single probe invocation.
///
/// Never shared across probes; consumed once to compute a duration.
#[derive(Debug, Default)]
pub struct TimingSample {
    points: Vec<(Checkpoint, Instant)>,
}

impl TimingSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, checkpoint: Checkpoint) {
        self.points.push((checkpoint, Instant::now()));
    }

    fn instant(&self, checkpoint: Checkpoint) -> Option<Instant> {
        self.points
            .iter()
            .find(|(c, _)| *c == checkpoint)
            .map(|(_, t)| *t)
    }

    /// Elapsed time from `from` to `to`, if both checkpoints were recorded.
    pub fn between(&self, from: Checkpoint, to: Checkpoint) -> Option<Duration> {
        let a = self.instant(from)?;
        let b = self.instant(to)?;
        b.checked_duration_since(a)
    }
}

/// One completed probe: body, headers, status, and the timing checkpoints
/// recorded around it.
pub struct ProbeResponse {
    pub body: String,
    pub headers: HeaderMap,
    pub status: StatusCode,
    pub timing: TimingSample,
}

impl ProbeResponse {
    /// Error out on non-2xx for call paths where success is required.
    pub fn ensure_success(self, host: &str) -> Result<Self, DiagError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(DiagError::UnexpectedStatus {
                host: host.to_string(),
                status: self.status.as_u16(),
            })
        }
    }
}

/// Shared HTTP client for all probes in a run.
pub struct ProbeClient {
    http: reqwest::Client,
    debug: bool,
}

impl ProbeClient {
    pub fn new(debug: bool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PROBE_TIMEOUT)
            .build()?;
        Ok(Self { http, debug })
    }

    /// Issue one timed `https://{hostname}{path}` request.
    ///
    /// Checkpoints: `Start` just before send, `Response` when status and
    /// headers become available, `End` once the body is fully read.
    pub async fn fetch(
        &self,
        hostname: &str,
        path: &str,
        method: Method,
    ) -> Result<ProbeResponse, DiagError> {
        let url = format!("https://{}{}", hostname, path);

        let mut timing = TimingSample::new();
        timing.mark(Checkpoint::Start);

        let response = self
            .http
            .request(method, &url)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .send()
            .await
            .map_err(|source| DiagError::Network {
                host: hostname.to_string(),
                source,
            })?;

        timing.mark(Checkpoint::Response);

        let status = response.status();
        let headers = response.headers().clone();

        if self.debug {
            // Diagnostic dump goes to the tracing stream on stderr, never
            // interleaving with the report on stdout.
            tracing::debug!(host = hostname, status = status.as_u16(), "probe response");
            for (name, value) in &headers {
                tracing::debug!(host = hostname, header = %name, value = ?value);
            }
        }

        let body = response
            .text()
            .await
            .map_err(|source| DiagError::Network {
                host: hostname.to_string(),
                source,
            })?;

        timing.mark(Checkpoint::End);

        Ok(ProbeResponse {
            body,
            headers,
            status,
            timing,
        })
    }
}
