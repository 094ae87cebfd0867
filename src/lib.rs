//! LevPay API gateway library.
//!
//! A single-upstream reverse proxy for the LevPay QR payment backend:
//! an endpoint allow-list, header whitelist, query rewriting, a bounded
//! upstream deadline and binary/JSON/text relay, with CORS on every response.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
