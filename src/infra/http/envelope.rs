//! JSON envelopes wrapping every response body.

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::cache::Source;

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub error: bool,
    pub message: String,
    pub status_code: u16,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: Vec<String>,
    pub status_code: u16,
    pub data: (),
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, messages: Vec<String>) -> Self {
        Self {
            error: true,
            message: messages,
            status_code: status.as_u16(),
            data: (),
        }
    }
}

/// Successful response: envelope body plus an optional cache status header.
#[derive(Debug)]
pub struct Reply<T> {
    status: StatusCode,
    envelope: Envelope<T>,
    cache: Option<Source>,
}

impl<T> Reply<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            envelope: Envelope {
                error: false,
                message: message.into(),
                status_code: status.as_u16(),
                data,
            },
            cache: None,
        }
    }

    /// Report whether the payload was served from cache (`x-cache: hit`) or the origin (`miss`).
    pub fn cache_status(mut self, source: Source) -> Self {
        self.cache = Some(source);
        self
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.envelope)).into_response();
        if let Some(source) = self.cache {
            let value = match source {
                Source::Cache => "hit",
                Source::Origin => "miss",
            };
            response
                .headers_mut()
                .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(value));
        }
        response
    }
}
