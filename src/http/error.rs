//! Error envelope returned to callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors that end request handling early.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The first path segment is not on the allow-list.
    #[error("Unknown endpoint")]
    UnknownEndpoint,

    /// The inbound body was declared JSON but did not parse.
    #[error("Invalid JSON body")]
    InvalidJson,

    /// The inbound body could not be read.
    #[error("Failed to read request body")]
    BodyRead,

    /// The inbound body exceeded the configured limit.
    #[error("Request body too large")]
    BodyTooLarge,

    /// The upstream exchange did not finish before the deadline.
    #[error("Upstream timeout")]
    UpstreamTimeout { upstream: String },

    /// Any other failure talking to the upstream.
    #[error("{message}")]
    Upstream { message: String, upstream: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UnknownEndpoint => StatusCode::NOT_FOUND,
            ProxyError::InvalidJson | ProxyError::BodyRead => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UpstreamTimeout { .. } | ProxyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ProxyError::UpstreamTimeout { upstream } | ProxyError::Upstream { upstream, .. } => {
                json!({ "success": false, "error": self.to_string(), "upstream": upstream })
            }
            _ => json!({ "success": false, "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
