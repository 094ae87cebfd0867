//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (body size cap, 413 on overflow)
//!     → [forwarder]
//!     → headers.rs (CORS on every response, no-store on binaries)
//! ```
//!
//! # Design Decisions
//! - The endpoint allow-list (routing) keeps the gateway from becoming an open proxy
//! - Credentials are forwarded, never inspected

pub mod headers;
pub mod limits;
