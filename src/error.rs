use thiserror::Error;

/// Failure taxonomy for the measurement pipeline.
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("request to {host} failed: {source}")]
    Network {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {host}")]
    UnexpectedStatus { host: String, status: u16 },

    #[error("malformed JSON payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("jsonp body has no callback delimiters to strip")]
    JsonpEnvelope,

    #[error("expected marker {marker:?} not found in page")]
    MarkerNotFound { marker: &'static str },

    #[error("response header {header} missing or too short")]
    HeaderMissing { header: &'static str },

    #[error("hostname resolution failed for {host}: {detail}")]
    Resolve { host: String, detail: String },

    #[error("zero-length transfer interval; bandwidth is undefined")]
    ZeroTransferTime,

    #[error("speedtest response carries no Content-Length header")]
    MissingContentLength,
}
