//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the fallback handler (static files or a plain 404)
//! - Put the conditional proxy in front of it
//! - Wire up request ID and tracing middleware
//! - Serve until shutdown, then drain

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    middleware::from_fn_with_state,
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::{FallbackConfig, GateConfig};
use crate::gate::{conditional_proxy_middleware, ConditionalProxy, TargetResolution};
use crate::lifecycle::Shutdown;

/// HTTP server: conditional proxy in front of a fallback handler.
pub struct GateServer {
    router: Router,
    shutdown: Shutdown,
}

impl GateServer {
    /// Create a server from configuration.
    pub fn new(config: &GateConfig, target: TargetResolution, shutdown: Shutdown) -> Self {
        let gate = ConditionalProxy::new(config.gate_options(), target, shutdown.clone());
        Self::with_fallback(gate, fallback_router(&config.fallback), shutdown)
    }

    /// Create a server around an arbitrary next handler.
    pub fn with_fallback(gate: ConditionalProxy, fallback: Router, shutdown: Shutdown) -> Self {
        let router = fallback
            .layer(from_fn_with_state(Arc::new(gate), conditional_proxy_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Self { router, shutdown }
    }

    /// The assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = self.shutdown.clone();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The next handler: static files when configured, else a plain 404.
fn fallback_router(config: &FallbackConfig) -> Router {
    let Some(dir) = &config.static_dir else {
        return Router::new().fallback(not_found);
    };

    tracing::info!(static_dir = %dir, spa_index = ?config.spa_index, "Serving fallback from disk");
    match &config.spa_index {
        Some(index) => {
            let index = Path::new(dir).join(index);
            Router::new().fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => Router::new().fallback_service(ServeDir::new(dir)),
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, format!("No resource at {}", uri.path()))
}
