//! CORS and cache response headers.
//!
//! # Responsibilities
//! - Stamp CORS headers on every response, errors and preflights included
//! - Answer CORS preflight requests locally
//! - Mark relayed binaries as non-cacheable
//!
//! # Design Decisions
//! - CORS is applied as the outermost layers, so responses produced by
//!   inner middleware (body limit, extractor rejections) carry it too
//! - Headers are overridden, never appended, so upstream values cannot leak through

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            CACHE_CONTROL,
        },
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, x-device-id";

/// The CORS headers every response carries.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN)),
        (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
        (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
    ]
}

/// Wrap a router so that every response gets the CORS headers.
pub fn with_cors<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    cors_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}

/// Local answer to a CORS preflight: 200 with an empty body.
pub fn preflight_response() -> Response {
    StatusCode::OK.into_response()
}

/// `Cache-Control: no-store` for relayed binaries.
pub fn no_store() -> (HeaderName, HeaderValue) {
    (CACHE_CONTROL, HeaderValue::from_static("no-store"))
}
