//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS / request-id / trace / body-limit layers)
//!     → forwarder.rs (preflight, allow-list, pipeline)
//!     → request.rs (typed inbound request, whitelisted headers, JSON body)
//!     → client.rs (upstream call under a deadline)
//!     → response.rs (binary / JSON / text relay)
//!     → error.rs (JSON envelope for every failure)
//!     → Send to client
//! ```

pub mod client;
pub mod error;
pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use forwarder::Forwarder;
pub use request::{MakeRequestUuidV4, X_DEVICE_ID, X_REQUEST_ID};
pub use server::HttpServer;
