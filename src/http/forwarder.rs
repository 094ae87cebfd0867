//! The request forwarder.
//!
//! One linear pipeline per request:
//! preflight → route decision → inbound capture → upstream call → relay.

use std::time::Instant;

use axum::{
    body::Body,
    http::{Method, Request},
    response::{IntoResponse, Response},
};

use crate::config::ProxyConfig;
use crate::http::client::{UpstreamClient, UpstreamError};
use crate::http::error::ProxyError;
use crate::http::request::{request_id, InboundRequest, UpstreamRequest};
use crate::http::response::relay;
use crate::observability::metrics;
use crate::routing::{Route, UpstreamTarget};
use crate::security::headers::preflight_response;

/// Forwards allowed requests to the single upstream.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    target: UpstreamTarget,
    mount_path: String,
    routing_param: String,
    max_body_size: usize,
}

impl Forwarder {
    pub fn new(config: &ProxyConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: UpstreamClient::new(config.upstream.timeout()),
            target: UpstreamTarget::new(&config.upstream.base_url)?,
            mount_path: config.upstream.mount_path.clone(),
            routing_param: config.upstream.routing_param.clone(),
            max_body_size: config.security.max_body_size,
        })
    }

    /// Handle one request; its raw path decides the route.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        if method == Method::OPTIONS {
            return preflight_response();
        }

        let request_id = request_id(request.headers());

        let Some(route) = Route::resolve(&self.mount_path, &path) else {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "Unknown endpoint");
            metrics::record_request(method.as_str(), 404, "unknown", start);
            return ProxyError::UnknownEndpoint.into_response();
        };

        let endpoint = route.endpoint.as_str();
        let response = match self.forward(&route, request, &request_id).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), endpoint, start);
        response
    }

    async fn forward(&self, route: &Route, request: Request<Body>, request_id: &str) -> Result<Response, ProxyError> {
        let inbound = InboundRequest::from_request(request, self.max_body_size).await?;
        let url = self.target.url_for(route, &inbound.query, &self.routing_param);

        tracing::debug!(
            request_id = %request_id,
            method = %inbound.method,
            endpoint = route.endpoint.as_str(),
            upstream_url = %url,
            "Forwarding request"
        );

        let upstream_request = UpstreamRequest::build(&inbound, url)?;
        let upstream = self
            .client
            .send(upstream_request)
            .await
            .map_err(|e| self.upstream_failure(request_id, e))?;

        relay(route, upstream).map_err(|e| self.upstream_failure(request_id, e))
    }

    fn upstream_failure(&self, request_id: &str, err: UpstreamError) -> ProxyError {
        metrics::record_upstream_error(err.kind());
        let upstream = self.target.base().to_string();

        match err {
            UpstreamError::Timeout(_) => {
                tracing::error!(
                    request_id = %request_id,
                    timeout = ?self.client.timeout(),
                    upstream = %upstream,
                    "Upstream timeout"
                );
                ProxyError::UpstreamTimeout { upstream }
            }
            other => {
                tracing::error!(request_id = %request_id, error = %other, upstream = %upstream, "Upstream error");
                let mut message = other.to_string();
                if message.is_empty() {
                    message = "Proxy error".to_string();
                }
                ProxyError::Upstream { message, upstream }
            }
        }
    }
}
