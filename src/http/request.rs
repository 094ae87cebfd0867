//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Capture the inbound request as an explicit, typed value
//! - Reduce inbound headers to the forwarded whitelist
//! - Re-serialize the inbound body as the JSON text sent upstream
//!
//! # Design Decisions
//! - Forwarded headers are struct fields, never an open map
//! - GET/HEAD bodies are never read
//! - Body parsing follows the media type: JSON, form or plain text

use axum::{
    body::{Body, Bytes},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, Method, Request,
    },
};
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::{form_urlencoded, Url};
use uuid::Uuid;

use crate::http::error::ProxyError;
use crate::routing::QueryParams;
use crate::security::limits::read_body;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Device identifier header passed through to the upstream.
pub const X_DEVICE_ID: HeaderName = HeaderName::from_static("x-device-id");

/// Generates UUID v4 request ids for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request id set by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// The only inbound headers that reach the upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedHeaders {
    pub accept: Option<HeaderValue>,
    pub content_type: Option<HeaderValue>,
    pub device_id: Option<HeaderValue>,
    pub authorization: Option<HeaderValue>,
}

impl ForwardedHeaders {
    /// Pick the whitelisted headers; empty values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pick = |name: &HeaderName| headers.get(name).filter(|v| !v.is_empty()).cloned();
        Self {
            accept: pick(&ACCEPT),
            content_type: pick(&CONTENT_TYPE),
            device_id: pick(&X_DEVICE_ID),
            authorization: pick(&AUTHORIZATION),
        }
    }

    /// The outgoing header set, defaults applied.
    pub fn to_upstream(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(
            ACCEPT,
            self.accept
                .clone()
                .unwrap_or_else(|| HeaderValue::from_static("*/*")),
        );
        headers.insert(
            CONTENT_TYPE,
            self.content_type
                .clone()
                .unwrap_or_else(|| HeaderValue::from_static("application/json")),
        );
        if let Some(device_id) = &self.device_id {
            headers.insert(X_DEVICE_ID, device_id.clone());
        }
        if let Some(authorization) = &self.authorization {
            headers.insert(AUTHORIZATION, authorization.clone());
        }
        headers
    }

    /// Lower-cased media type without parameters.
    fn media_type(&self) -> Option<String> {
        let value = self.content_type.as_ref()?.to_str().ok()?;
        value
            .split(';')
            .next()
            .map(|essence| essence.trim().to_ascii_lowercase())
    }
}

/// An inbound request reduced to what the forwarder uses.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub query: QueryParams,
    pub headers: ForwardedHeaders,
    pub body: Bytes,
}

impl InboundRequest {
    /// Capture a request, reading at most `max_body_size` body bytes.
    pub async fn from_request(request: Request<Body>, max_body_size: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let body = if carries_body(&parts.method) {
            read_body(body, max_body_size).await?
        } else {
            Bytes::new()
        };

        Ok(Self {
            query: QueryParams::parse(parts.uri.query()),
            headers: ForwardedHeaders::from_headers(&parts.headers),
            method: parts.method,
            body,
        })
    }

    /// The JSON text forwarded upstream, `None` for GET/HEAD.
    pub fn upstream_body(&self) -> Result<Option<String>, ProxyError> {
        if !carries_body(&self.method) {
            return Ok(None);
        }

        let value = self.parsed_body()?;
        if is_falsy(&value) {
            return Ok(Some("{}".to_string()));
        }
        serde_json::to_string(&value)
            .map(Some)
            .map_err(|_| ProxyError::InvalidJson)
    }

    /// Decode the body the way its media type says.
    fn parsed_body(&self) -> Result<Value, ProxyError> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }

        match self.headers.media_type().as_deref() {
            Some("application/json") | Some("application/ld+json") => {
                serde_json::from_slice(&self.body).map_err(|_| ProxyError::InvalidJson)
            }
            Some("application/x-www-form-urlencoded") => Ok(form_to_json(&self.body)),
            _ => Ok(Value::String(String::from_utf8_lossy(&self.body).into_owned())),
        }
    }
}

/// A fully prepared upstream request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl UpstreamRequest {
    pub fn build(inbound: &InboundRequest, url: Url) -> Result<Self, ProxyError> {
        Ok(Self {
            method: inbound.method.clone(),
            url,
            headers: inbound.headers.to_upstream(),
            body: inbound.upstream_body()?,
        })
    }
}

fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Values that count as "no body": `null`, `false`, `0` and `""`.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Form fields as a JSON object; repeated fields become arrays.
fn form_to_json(body: &[u8]) -> Value {
    let mut object = Map::new();
    for (key, value) in form_urlencoded::parse(body) {
        let value = Value::String(value.into_owned());
        match object.get_mut(&*key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(object)
}
