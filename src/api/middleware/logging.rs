//! Request logging with API key and credential redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::domain::api_key::API_KEY_PREFIX;

static API_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"sk-itumy-v1-api_([0-9A-Za-z]{0,8})[0-9A-Za-z]*").unwrap());

const REQUEST_ID_HEADER: &str = "x-request-id";

/// How a request header appears in the log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderPolicy {
    Show,
    Redact,
    Skip,
}

impl HeaderPolicy {
    fn for_header(name: &str) -> Self {
        match name {
            "authorization" | "proxy-authorization" | "x-api-key" | "cookie" | "set-cookie" => {
                Self::Redact
            }
            "content-type" | "content-length" | "accept" | "user-agent" | REQUEST_ID_HEADER
            | "x-forwarded-for" | "x-real-ip" => Self::Show,
            _ => Self::Skip,
        }
    }
}

/// Loggable view of an incoming request; keys are already shortened
struct RequestSummary {
    method: String,
    route: String,
    uri: String,
    request_id: String,
    headers: String,
}

impl RequestSummary {
    fn capture(request: &Request<Body>) -> Self {
        let route = match request.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_string(),
            None => redact_api_keys(request.uri().path()),
        };

        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

        Self {
            method: request.method().to_string(),
            route,
            uri: redact_api_keys(&request.uri().to_string()),
            request_id,
            headers: describe_headers(request.headers()),
        }
    }
}

/// Logs each request on arrival and completion.
///
/// Spans come from the `TraceLayer` wrapping the router, so none is opened here.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let summary = RequestSummary::capture(&request);

    info!(
        method = %summary.method,
        path = %summary.route,
        uri = %summary.uri,
        request_id = %summary.request_id,
        headers = %summary.headers,
        "Request received"
    );

    let response = next.run(request).await;

    info!(
        method = %summary.method,
        path = %summary.route,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        request_id = %summary.request_id,
        "Request finished"
    );

    response
}

fn describe_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str();
            let shown = match HeaderPolicy::for_header(name) {
                HeaderPolicy::Skip => return None,
                HeaderPolicy::Redact => "[REDACTED]".to_string(),
                HeaderPolicy::Show => redact_api_keys(value.to_str().unwrap_or("[invalid]")),
            };
            Some(format!("{}={}", name, shown))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shorten every API key in `text` to its prefix and first 8 random characters
pub fn redact_api_keys(text: &str) -> String {
    API_KEY_PATTERN
        .replace_all(text, format!("{}${{1}}…", API_KEY_PREFIX).as_str())
        .into_owned()
}
