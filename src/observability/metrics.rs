//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests seen by the gate, by outcome
//! - `gate_upstream_duration_seconds` (histogram): time spent on a
//!   forwarding attempt, by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// What the gate did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Upstream response relayed.
    Handled,
    /// Upstream returned 404; next handler ran.
    FellThrough,
    /// Path not eligible; next handler ran.
    Skipped,
    /// Forwarding attempt failed.
    Failed,
}

impl GateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateOutcome::Handled => "handled",
            GateOutcome::FellThrough => "fallthrough",
            GateOutcome::Skipped => "skipped",
            GateOutcome::Failed => "error",
        }
    }
}

/// Record one gate decision. `started` is set when an upstream attempt ran.
pub fn record_outcome(outcome: GateOutcome, started: Option<Instant>) {
    counter!("gate_requests_total", "outcome" => outcome.as_str()).increment(1);
    if let Some(started) = started {
        histogram!("gate_upstream_duration_seconds", "outcome" => outcome.as_str())
            .record(started.elapsed().as_secs_f64());
    }
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
