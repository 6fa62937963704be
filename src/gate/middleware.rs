//! Prefix gate.
//!
//! # Responsibilities
//! - Decide per request whether the path qualifies for proxying
//! - Run the executor for eligible requests
//! - Hand ineligible and upstream-404 requests to the next handler
//!
//! # Design Decisions
//! - Holds no per-request mutable state; shared behind an `Arc`
//! - A 404 from the upstream never reaches the caller

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::gate::cancel;
use crate::gate::executor::{ProxyExecutor, ProxyOutcome};
use crate::gate::prefix::PathPrefix;
use crate::gate::target::TargetResolution;
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{self, GateOutcome};

/// Construction-time options of a gate.
#[derive(Debug, Clone)]
pub struct GateOptions {
    /// Requests under this prefix are eligible (`/` means all of them).
    pub path_prefix: String,
    /// Upper bound on one forwarding attempt.
    pub request_timeout: Duration,
}

/// Conditional proxy in front of the rest of the pipeline.
#[derive(Clone)]
pub struct ConditionalProxy {
    prefix: PathPrefix,
    executor: ProxyExecutor,
}

impl ConditionalProxy {
    pub fn new(options: GateOptions, target: TargetResolution, shutdown: Shutdown) -> Self {
        let prefix = PathPrefix::new(&options.path_prefix);
        tracing::info!(
            prefix = %prefix,
            request_timeout = ?options.request_timeout,
            "Conditional proxy configured"
        );

        Self {
            prefix,
            executor: ProxyExecutor::new(target, options.request_timeout, shutdown),
        }
    }

    /// Proxy `request` if eligible, otherwise (or on upstream 404) run `next`.
    pub async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        if !self.prefix.matches(request.uri().path()) {
            metrics::record_outcome(GateOutcome::Skipped, None);
            return next.run(request).await;
        }

        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        // Dropping this future (caller gone) fires the guard.
        let (caller, _caller_guard) = cancel::caller_token();

        match self.executor.forward(request, caller).await {
            Ok(ProxyOutcome::Handled(response)) => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    status = %response.status(),
                    "Upstream handled request"
                );
                metrics::record_outcome(GateOutcome::Handled, Some(started));
                response
            }
            Ok(ProxyOutcome::NotHandled(request)) => {
                tracing::debug!(method = %method, path = %path, "Upstream returned 404, falling through");
                metrics::record_outcome(GateOutcome::FellThrough, Some(started));
                next.run(request).await
            }
            Err(err) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    kind = err.kind(),
                    error = %err,
                    "Proxy attempt failed"
                );
                metrics::record_outcome(GateOutcome::Failed, Some(started));
                err.into_response()
            }
        }
    }
}

/// Axum middleware entry point, for use with `from_fn_with_state`.
pub async fn conditional_proxy_middleware(
    State(gate): State<Arc<ConditionalProxy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    gate.handle(request, next).await
}
