//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, request ID, tracing, body limit)
//! - Bind server to listener
//! - Dispatch every request to the forwarder
//! - Drain in-flight requests on shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::forwarder::Forwarder;
use crate::http::request::MakeRequestUuidV4;
use crate::security::headers::with_cors;
use crate::security::limits::{body_limit_layer, reject_declared_oversize};

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, url::ParseError> {
        let forwarder = Arc::new(Forwarder::new(&config)?);
        let router = Self::build_router(&config, forwarder);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, forwarder: Arc<Forwarder>) -> Router {
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(forwarder)
            .layer(body_limit_layer(config.security.max_body_size))
            .layer(middleware::from_fn_with_state(
                config.security.max_body_size,
                reject_declared_oversize,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4));

        with_cors(router)
    }

    /// The fully layered router, for serving or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn proxy_handler(State(forwarder): State<Arc<Forwarder>>, request: Request<Body>) -> Response {
    forwarder.handle(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{
            header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH},
            Method, StatusCode,
        },
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::http::request::X_REQUEST_ID;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        // nothing listens here; any upstream call would fail with 502
        config.upstream.base_url = "http://127.0.0.1:9".into();
        config.security.max_body_size = 1024;
        HttpServer::new(config).unwrap()
    }

    async fn call(method: Method, uri: &str, body: Body) -> Response {
        server()
            .router()
            .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_anywhere() {
        for uri in ["/api/createqr", "/api/whatever", "/", "/elsewhere/deep"] {
            let resp = call(Method::OPTIONS, uri, Body::empty()).await;
            assert_eq!(resp.status(), StatusCode::OK, "uri {uri}");
            assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        for uri in ["/api/admin", "/api/users/1", "/", "/createqr"] {
            let resp = call(Method::GET, uri, Body::empty()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "uri {uri}");
            assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                json_body(resp).await,
                json!({ "success": false, "error": "Unknown endpoint" })
            );
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_502_envelope() {
        let resp = call(Method::POST, "/api/cancel", Body::from("{}")).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = json_body(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["upstream"], "http://127.0.0.1:9");
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let resp = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/createqr")
                    .header(CONTENT_LENGTH, 4096)
                    .body(Body::from(vec![b'x'; 4096]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            json_body(resp).await,
            json!({ "success": false, "error": "Request body too large" })
        );
    }

    #[tokio::test]
    async fn test_undecodable_path_is_unknown_endpoint() {
        let resp = call(Method::GET, "/api/qr/%FF.png", Body::empty()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            json_body(resp).await,
            json!({ "success": false, "error": "Unknown endpoint" })
        );
    }

    #[tokio::test]
    async fn test_malformed_json_rejected_locally() {
        let resp = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/createqr")
                    .header("content-type", "application/json")
                    .body(Body::from("{nope"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_request_id_on_response() {
        let resp = call(Method::GET, "/api/admin", Body::empty()).await;
        assert!(resp.headers().contains_key(X_REQUEST_ID));
    }
}
