//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (one deadline for connect, response and body)
//!     → On expiry: distinct timeout error, surfaced once as 502
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: a failure is reported to the caller exactly once

pub mod timeouts;

pub use timeouts::{Deadline, DeadlineExceeded};
