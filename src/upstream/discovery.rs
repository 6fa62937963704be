//! Target sources and the listener readiness probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::error::ResolveError;
use crate::gate::{ProxyTarget, TargetResolution};
use crate::upstream::backoff::next_probe_delay;

/// Where the upstream address comes from.
#[derive(Debug, Clone)]
pub enum TargetSource {
    /// Known and assumed ready.
    Static(ProxyTarget),
    /// Known, but requests wait until it accepts TCP connections.
    WaitForListener {
        target: ProxyTarget,
        startup_timeout: Duration,
    },
}

impl TargetSource {
    /// Build the shared resolution. Must be called inside a Tokio runtime.
    pub fn into_resolution(self) -> TargetResolution {
        match self {
            TargetSource::Static(target) => TargetResolution::ready(target),
            TargetSource::WaitForListener {
                target,
                startup_timeout,
            } => TargetResolution::spawn(wait_for_listener(target, startup_timeout)),
        }
    }
}

/// Poll `target` with TCP connects until one succeeds or `startup_timeout`
/// elapses.
pub async fn wait_for_listener(
    target: ProxyTarget,
    startup_timeout: Duration,
) -> Result<ProxyTarget, ResolveError> {
    let address = target.socket_address();
    let deadline = Instant::now() + startup_timeout;
    let mut attempt = 0u32;

    tracing::info!(upstream = %target, timeout = ?startup_timeout, "Waiting for upstream to accept connections");

    loop {
        attempt += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());

        let failure = match tokio::time::timeout(remaining, TcpStream::connect(address.as_str())).await {
            Ok(Ok(_)) => {
                tracing::info!(upstream = %target, attempts = attempt, "Upstream is accepting connections");
                return Ok(target);
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "connect timed out".to_string(),
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let Some(delay) = next_probe_delay(attempt, remaining) else {
            tracing::error!(upstream = %target, attempts = attempt, error = %failure, "Upstream never started listening");
            return Err(ResolveError::new(format!(
                "upstream {target} did not accept connections within {startup_timeout:?} (last error: {failure})"
            )));
        };

        tracing::debug!(upstream = %target, attempt, delay = ?delay, error = %failure, "Upstream not ready yet");
        tokio::time::sleep(delay).await;
    }
}
