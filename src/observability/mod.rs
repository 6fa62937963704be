//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gate, server, resolver
//!     → logging.rs (structured log events)
//!     → metrics.rs (per-outcome counters, upstream latency)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing, pretty for development
//! - Metrics are cheap; the exporter is optional

pub mod logging;
pub mod metrics;
