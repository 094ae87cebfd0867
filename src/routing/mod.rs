//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Decoded request path + raw query
//!     → endpoint.rs (mount prefix, allow-list → Route or rejection)
//!     → target.rs (base + api/ + encoded segments + filtered query → Url)
//! ```
//!
//! # Design Decisions
//! - The allow-list decision happens before any network activity
//! - No regex; a route is decided by its first segment only

pub mod endpoint;
pub mod target;

pub use endpoint::{Endpoint, Route};
pub use target::{QueryParams, UpstreamTarget};
