//! Per-request bookkeeping: a request id echoed to the caller and one log line per response.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

use super::envelope::CACHE_STATUS_HEADER;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_INBOUND_ID_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Served,
    Rejected,
    Failed,
}

impl Outcome {
    fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::Failed
        } else if status.is_client_error() {
            Self::Rejected
        } else {
            Self::Served
        }
    }
}

/// Tags the request with an id, echoes it back and logs the outcome with its cache status.
pub async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let request_id = inbound_request_id(request.headers())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    let cache = cache_status(response.headers())
        .unwrap_or("none")
        .to_string();

    match Outcome::of(status) {
        Outcome::Served => debug!(
            target = "jester::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            cache = %cache,
            request_id = %request_id,
            "request served",
        ),
        outcome => {
            let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
                Some(report) => (report.source, report.messages),
                None => ("unknown", Vec::new()),
            };
            let detail = messages
                .first()
                .map(String::as_str)
                .unwrap_or("no diagnostic available");

            if outcome == Outcome::Failed {
                error!(
                    target = "jester::http::response",
                    status = status.as_u16(),
                    method = %method,
                    path = %path,
                    elapsed_ms,
                    cache = %cache,
                    source,
                    detail,
                    chain = ?messages,
                    request_id = %request_id,
                    "request failed",
                );
            } else {
                warn!(
                    target = "jester::http::response",
                    status = status.as_u16(),
                    method = %method,
                    path = %path,
                    elapsed_ms,
                    source,
                    detail,
                    request_id = %request_id,
                    "request rejected",
                );
            }
        }
    }

    response
}

/// Caller-supplied ids are kept when they are printable and short.
fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(&REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_INBOUND_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

fn cache_status(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(&CACHE_STATUS_HEADER)
        .and_then(|value| value.to_str().ok())
}
