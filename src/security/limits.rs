//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//! - Report oversized bodies as 413 in the gateway's JSON envelope
//!
//! # Design Decisions
//! - Declared lengths are checked before the body is touched, so the
//!   tower-http layer only ever sees bodies of unknown length
//! - Chunked bodies are capped while reading

use std::error::Error as StdError;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use tower_http::limit::RequestBodyLimitLayer;

use crate::http::error::ProxyError;

/// Layer rejecting bodies whose declared length exceeds `max`.
pub fn body_limit_layer(max: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max)
}

/// Middleware answering a declared `Content-Length` above `max` with the
/// JSON 413 envelope.
pub async fn reject_declared_oversize(State(max): State<usize>, request: Request, next: Next) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(len) if len > max as u64 => {
            tracing::warn!(declared = len, max, "Request body too large");
            ProxyError::BodyTooLarge.into_response()
        }
        _ => next.run(request).await,
    }
}

/// Read a request body, failing once it grows past `max` bytes.
pub async fn read_body(body: Body, max: usize) -> Result<Bytes, ProxyError> {
    to_bytes(body, max).await.map_err(|e| {
        let inner = e.into_inner();
        if exceeded_limit(&*inner) {
            ProxyError::BodyTooLarge
        } else {
            tracing::warn!(error = %inner, "Failed to read request body");
            ProxyError::BodyRead
        }
    })
}

fn exceeded_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
