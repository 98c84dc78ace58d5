//! Extraction of structured data from the three response shapes the edge
//! endpoints produce: strict JSON, JSONP-wrapped JS object literals, and the
//! bootstrap HTML page.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::DiagError;

/// Strict-JSON mode with the legacy leniency: a non-2xx status or an
/// unparseable body yields an empty object instead of an error. Only this
/// mode is allowed to swallow failures.
pub fn lenient_json(status: StatusCode, body: &str) -> Value {
    if !status.is_success() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// Unwrap a JSONP body of the form `callback({...});`.
///
/// Anchored on the first `(` and the last `)` rather than fixed offsets, so
/// upstream format drift fails loudly instead of silently truncating. The
/// service emits JS-style object literals with single-quoted strings; those
/// are normalized to double quotes before parsing.
pub fn unwrap_jsonp(body: &str) -> Result<Value, DiagError> {
    let open = body.find('(').ok_or(DiagError::JsonpEnvelope)?;
    let close = body.rfind(')').ok_or(DiagError::JsonpEnvelope)?;
    if close <= open {
        return Err(DiagError::JsonpEnvelope);
    }

    let normalized = body[open + 1..close].replace('\'', "\"");
    Ok(serde_json::from_str(&normalized)?)
}

fn xff_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Table cell marked with the xff attribute, text content up to the
    // closing tag.
    RE.get_or_init(|| Regex::new(r#"xff">([^<]*)"#).expect("static pattern"))
}

/// Pull the X-Forwarded-For value out of the bootstrap HTML page.
pub fn extract_xff(body: &str) -> Result<String, DiagError> {
    xff_pattern()
        .captures(body)
        .map(|c| c[1].to_string())
        .ok_or(DiagError::MarkerNotFound { marker: "xff" })
}

/// Datacenter code: the last three characters of the X-Served-By header.
pub fn extract_datacenter(headers: &HeaderMap) -> Result<String, DiagError> {
    let missing = DiagError::HeaderMissing {
        header: "X-Served-By",
    };
    let value = headers
        .get("x-served-by")
        .and_then(|v| v.to_str().ok())
        .ok_or(missing)?;
    if value.len() < 3 {
        return Err(DiagError::HeaderMissing {
            header: "X-Served-By",
        });
    }
    Ok(value[value.len() - 3..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn lenient_json_parses_good_body() {
        let v = lenient_json(StatusCode::OK, r#"{"cwnd": 10}"#);
        assert_eq!(v, json!({"cwnd": 10}));
    }

    #[test]
    fn lenient_json_empty_object_on_non_success() {
        let v = lenient_json(StatusCode::SERVICE_UNAVAILABLE, r#"{"cwnd": 10}"#);
        assert_eq!(v, json!({}));
    }

    #[test]
    fn lenient_json_empty_object_on_garbage() {
        let v = lenient_json(StatusCode::OK, "<html>not json</html>");
        assert_eq!(v, json!({}));
    }

    #[test]
    fn jsonp_unwraps_single_quoted_literal() {
        let body = "fastly.setPopName({'popname':'LHR'});";
        let v = unwrap_jsonp(body).unwrap();
        assert_eq!(v, json!({"popname": "LHR"}));
    }

    #[test]
    fn jsonp_unwraps_nested_payload() {
        let body = "FASTLY.setupPerfmap({'geo_ip': {'cc': 'US'}, 'pops': [{'hostname': 'a.example', 'popId': 'SJC'}]});";
        let v = unwrap_jsonp(body).unwrap();
        assert_eq!(v["geo_ip"]["cc"], "US");
        assert_eq!(v["pops"][0]["popId"], "SJC");
    }

    #[test]
    fn jsonp_rejects_missing_delimiters() {
        assert!(matches!(
            unwrap_jsonp("no callback here"),
            Err(DiagError::JsonpEnvelope)
        ));
        assert!(matches!(
            unwrap_jsonp(")backwards("),
            Err(DiagError::JsonpEnvelope)
        ));
    }

    #[test]
    fn jsonp_rejects_malformed_inner_content() {
        assert!(matches!(
            unwrap_jsonp("cb({not valid});"),
            Err(DiagError::Parse(_))
        ));
    }

    #[test]
    fn xff_extracted_from_table_cell() {
        let html = r#"<table><td class="xff">203.0.113.7, 10.0.0.1</td></table>"#;
        assert_eq!(extract_xff(html).unwrap(), "203.0.113.7, 10.0.0.1");
    }

    #[test]
    fn xff_missing_marker_errors() {
        assert!(matches!(
            extract_xff("<html></html>"),
            Err(DiagError::MarkerNotFound { marker: "xff" })
        ));
    }

    #[test]
    fn datacenter_is_last_three_of_x_served_by() {
        let mut headers = HeaderMap::new();
        headers.insert("x-served-by", HeaderValue::from_static("cache-lax1234-LAX"));
        assert_eq!(extract_datacenter(&headers).unwrap(), "LAX");
    }

    #[test]
    fn datacenter_missing_header_errors() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_datacenter(&headers),
            Err(DiagError::HeaderMissing { .. })
        ));
    }
}
