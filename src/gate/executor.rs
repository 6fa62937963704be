//! One forwarding attempt.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → await shared target resolution
//!     → build outbound request (URI, filtered headers, streamed body)
//!     → send under cancel scope (timeout | shutdown | caller gone)
//!     → 404: drain body, hand the request head back   (NotHandled)
//!     → else: filtered headers + guarded streaming body (Handled)
//! ```
//!
//! # Design Decisions
//! - One pooled client per executor, cloned into each send
//! - The send runs on its own task; the caller token is its only link to
//!   the inbound future
//! - No retries and no redirect following

use std::time::Duration;

use axum::body::Body;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::request::Parts;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio_util::sync::CancellationToken;

use crate::error::ProxyError;
use crate::gate::body::GuardedBody;
use crate::gate::cancel::{CancelReason, CancelScope};
use crate::gate::headers;
use crate::gate::target::{ProxyTarget, TargetResolution};
use crate::lifecycle::Shutdown;

/// Bytes of a 404 body we read to keep the connection reusable.
const DRAIN_LIMIT: usize = 64 * 1024;

/// Result of a forwarding attempt.
#[derive(Debug)]
pub enum ProxyOutcome {
    /// The upstream answered 404. Holds the original request head; its body
    /// has already been streamed upstream and is replaced by an empty one.
    NotHandled(Request<Body>),
    /// Any other status. The response streams the upstream body.
    Handled(Response<Body>),
}

/// Forwards requests to the resolved upstream.
#[derive(Clone)]
pub struct ProxyExecutor {
    client: Client<HttpConnector, Body>,
    target: TargetResolution,
    timeout: Duration,
    shutdown: Shutdown,
}

impl ProxyExecutor {
    pub fn new(target: TargetResolution, timeout: Duration, shutdown: Shutdown) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_connect_timeout(Some(timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            target,
            timeout,
            shutdown,
        }
    }

    /// Execute one forwarding attempt.
    ///
    /// `caller` is cancelled when the inbound caller goes away.
    pub async fn forward(
        &self,
        request: Request<Body>,
        caller: CancellationToken,
    ) -> Result<ProxyOutcome, ProxyError> {
        let target = self.resolve_target(&caller).await?;

        let scope = CancelScope::new(self.timeout, self.shutdown.token()).with_caller(caller);
        let (parts, body) = request.into_parts();
        let outbound = build_outbound(&parts, body, &target)?;

        tracing::debug!(
            method = %parts.method,
            uri = %outbound.uri(),
            "Forwarding to upstream"
        );

        let client = self.client.clone();
        let send_scope = scope.clone();
        let send_target = target.clone();
        let send = tokio::spawn(async move {
            match send_scope.run(client.request(outbound)).await {
                Ok(result) => result.map_err(|e| ProxyError::from_client(e, &send_target)),
                Err(reason) => Err(ProxyError::UpstreamTimeout { reason }),
            }
        });

        let response = send.await.map_err(|e| ProxyError::UpstreamUnreachable {
            target: target.to_string(),
            source: Box::new(e),
        })??;

        if response.status() == StatusCode::NOT_FOUND {
            discard_body(response.into_body(), &scope).await;
            return Ok(ProxyOutcome::NotHandled(fallthrough_request(parts)));
        }

        let (head, body) = response.into_parts();
        let mut relayed = Response::new(Body::new(GuardedBody::new(body, scope.detached())));
        *relayed.status_mut() = head.status;
        *relayed.headers_mut() = headers::response_headers(&head.headers);

        Ok(ProxyOutcome::Handled(relayed))
    }

    /// Await the shared resolution without re-triggering it.
    ///
    /// The request timeout does not cover this wait; the resolver bounds its
    /// own startup. Shutdown and caller disconnect still end it.
    async fn resolve_target(&self, caller: &CancellationToken) -> Result<ProxyTarget, ProxyError> {
        if let Some(done) = self.target.peek() {
            return Ok(done?);
        }

        tracing::debug!("Waiting for upstream target resolution");
        let shutdown = self.shutdown.token();
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(ProxyError::UpstreamTimeout { reason: CancelReason::Shutdown }),
            _ = caller.cancelled() => Err(ProxyError::UpstreamTimeout { reason: CancelReason::CallerGone }),
            resolved = self.target.resolve() => Ok(resolved?),
        }
    }
}

fn build_outbound(parts: &Parts, body: Body, target: &ProxyTarget) -> Result<Request<Body>, ProxyError> {
    let uri = target.uri_for(&parts.uri)?;
    let host = target.host_header()?;

    let mut outbound = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .body(body)?;
    *outbound.headers_mut() = headers::request_headers(&parts.headers, host);

    Ok(outbound)
}

/// The original request head with an empty body. Framing headers describing
/// the consumed body are dropped.
fn fallthrough_request(mut parts: Parts) -> Request<Body> {
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.remove(TRANSFER_ENCODING);
    Request::from_parts(parts, Body::empty())
}

/// Read and drop a 404 body so nothing of it reaches the caller.
async fn discard_body(mut body: Incoming, scope: &CancelScope) {
    let drain = async {
        let mut drained = 0usize;
        while let Some(frame) = body.frame().await {
            let Ok(frame) = frame else { break };
            if let Some(data) = frame.data_ref() {
                drained += data.len();
                if drained > DRAIN_LIMIT {
                    break;
                }
            }
        }
    };

    if let Err(reason) = scope.run(drain).await {
        tracing::debug!(reason = %reason, "Stopped draining upstream 404 body");
    }
}
