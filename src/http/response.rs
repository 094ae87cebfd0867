//! Response handling and transformation.
//!
//! # Responsibilities
//! - Decide how an upstream response is relayed: binary, JSON or raw text
//! - Mirror the upstream status and content-type
//! - Mark binary relays as non-cacheable
//!
//! # Design Decisions
//! - Bodies are buffered whole; the upstream serves small JSON documents and QR images
//! - JSON detection is a decode attempt with an explicit fallback, not an error path
//! - A failed body read only matters for binaries; text relays treat it as empty

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::http::client::{UpstreamError, UpstreamResponse};
use crate::routing::Route;
use crate::security::headers::no_store;

/// Result of decoding an upstream text body.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPayload {
    Json(Value),
    Raw(String),
}

impl TextPayload {
    /// Try JSON first; empty text decodes as `{}`.
    pub fn decode(text: String) -> Self {
        let candidate = if text.is_empty() { "{}" } else { text.as_str() };
        match serde_json::from_str(candidate) {
            Ok(value) => TextPayload::Json(value),
            Err(_) => TextPayload::Raw(text),
        }
    }
}

/// How a response body is sent back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Relay {
    Binary(Bytes),
    Json(Value),
    Text(String),
}

/// Binary when the route fetches a QR file or the upstream says it is an image.
pub fn is_binary(route: &Route, content_type: Option<&HeaderValue>) -> bool {
    route.is_qr_file()
        || content_type
            .and_then(|ct| ct.to_str().ok())
            .is_some_and(|ct| ct.contains("image/"))
}

impl Relay {
    /// Choose the relay mode and decode the body accordingly.
    pub fn decide(route: &Route, upstream: &UpstreamResponse) -> Result<Self, UpstreamError> {
        if is_binary(route, upstream.content_type.as_ref()) {
            return upstream
                .body
                .clone()
                .map(Relay::Binary)
                .map_err(UpstreamError::Body);
        }

        let text = match &upstream.body {
            Ok(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "Upstream body unreadable, relaying as empty text");
                String::new()
            }
        };

        Ok(match TextPayload::decode(text) {
            TextPayload::Json(value) => Relay::Json(value),
            TextPayload::Raw(text) => Relay::Text(text),
        })
    }

    /// Build the caller-facing response.
    pub fn respond(self, status: StatusCode, content_type: Option<HeaderValue>) -> Response {
        match self {
            Relay::Binary(bytes) => {
                let mut response = (status, [no_store()], Body::from(bytes)).into_response();
                if let Some(ct) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, ct);
                }
                response
            }
            Relay::Json(value) => (status, Json(value)).into_response(),
            Relay::Text(text) => {
                let ct = content_type
                    .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
                (status, [(CONTENT_TYPE, ct)], text).into_response()
            }
        }
    }
}

/// Relay an upstream response to the caller.
pub fn relay(route: &Route, upstream: UpstreamResponse) -> Result<Response, UpstreamError> {
    let relay = Relay::decide(route, &upstream)?;
    Ok(relay.respond(upstream.status, upstream.content_type))
}
