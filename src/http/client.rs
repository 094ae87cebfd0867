//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Turn an `UpstreamRequest` into a hyper request
//! - Run the exchange (response head and full body) under one deadline
//! - Classify failures as timeout, transport or body-read errors
//!
//! # Design Decisions
//! - Pooled hyper-util client, shared by all requests
//! - On deadline expiry the in-flight future is dropped, aborting the call
//! - Body-read failures are returned alongside the response, not as errors,
//!   so the relay can decide whether they matter

use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, HeaderValue, Request, StatusCode, Uri},
};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::request::UpstreamRequest;
use crate::resilience::{Deadline, DeadlineExceeded};

/// Failures talking to the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    /// Connect, protocol or request-construction failure.
    #[error("{0}")]
    Transport(String),

    /// The response body could not be read.
    #[error("{0}")]
    Body(String),
}

impl UpstreamError {
    /// Label for the `gateway_upstream_errors_total` metric.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Body(_) => "body",
        }
    }
}

/// What came back from the upstream.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    /// The full body, or the message of the error that interrupted it.
    pub body: Result<Bytes, String>,
}

/// Client for the single upstream.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and collect the response before the deadline.
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let request = into_hyper(request)?;
        let deadline = Deadline::after(self.timeout);

        deadline
            .run(async {
                let response = self
                    .client
                    .request(request)
                    .await
                    .map_err(|e| UpstreamError::Transport(error_chain(&e)))?;

                let (parts, body) = response.into_parts();
                let body = collect_body(body).await;

                Ok::<_, UpstreamError>(UpstreamResponse {
                    status: parts.status,
                    content_type: parts.headers.get(CONTENT_TYPE).cloned(),
                    body,
                })
            })
            .await?
    }
}

fn into_hyper(request: UpstreamRequest) -> Result<Request<Body>, UpstreamError> {
    let uri: Uri = request
        .url
        .as_str()
        .parse()
        .map_err(|e| UpstreamError::Transport(format!("invalid upstream URL: {e}")))?;

    let mut builder = Request::builder().method(request.method).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(request.headers);
    }

    builder
        .body(request.body.map(Body::from).unwrap_or_else(Body::empty))
        .map_err(|e| UpstreamError::Transport(e.to_string()))
}

async fn collect_body(body: Incoming) -> Result<Bytes, String> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| error_chain(&e))
}

/// An error message followed by its sources, `outer: inner: root`.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        message.push_str(": ");
        message.push_str(&e.to_string());
        source = e.source();
    }
    message
}
