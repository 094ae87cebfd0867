//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder and middleware produce:
//!     → logging.rs (structured log events, request-id in every span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (log aggregation is external)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
