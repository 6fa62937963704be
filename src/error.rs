//! Error types for the proxy gate.
//!
//! Only an upstream 404 makes the gate fall through. Everything here is a
//! hard failure that is reported to the caller as a server-side error.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::gate::cancel::CancelReason;
use crate::gate::target::ProxyTarget;

/// Boxed error used for transport-level sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The upstream address could not be determined.
///
/// Cloneable so that one failed resolution can be delivered to every
/// waiting request.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResolveError {
    message: Arc<str>,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }
}

/// Failure of a single forwarding attempt.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream target could not be resolved: {0}")]
    TargetResolution(#[from] ResolveError),

    #[error("upstream {target} is unreachable: {source}")]
    UpstreamUnreachable {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("upstream request aborted: {reason}")]
    UpstreamTimeout { reason: CancelReason },

    #[error("upstream returned a malformed response: {source}")]
    UpstreamProtocol {
        #[source]
        source: BoxError,
    },

    #[error("could not build outbound request: {0}")]
    InvalidRequest(#[from] http::Error),
}

impl ProxyError {
    /// Classify an error returned by the pooled client.
    pub(crate) fn from_client(err: hyper_util::client::legacy::Error, target: &ProxyTarget) -> Self {
        if err.is_connect() {
            ProxyError::UpstreamUnreachable {
                target: target.to_string(),
                source: Box::new(err),
            }
        } else {
            ProxyError::UpstreamProtocol {
                source: Box::new(err),
            }
        }
    }

    /// Short label used in logs, metrics and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::TargetResolution(_) => "target_resolution",
            ProxyError::UpstreamUnreachable { .. } => "upstream_unreachable",
            ProxyError::UpstreamTimeout { .. } => "upstream_timeout",
            ProxyError::UpstreamProtocol { .. } => "upstream_protocol",
            ProxyError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::TargetResolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout { reason } => match reason {
                CancelReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
                CancelReason::Shutdown => StatusCode::SERVICE_UNAVAILABLE,
                // Nobody is left to read this one.
                CancelReason::CallerGone => StatusCode::BAD_GATEWAY,
            },
            ProxyError::UpstreamProtocol { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
