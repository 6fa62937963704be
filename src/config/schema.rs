//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::gate::{GateOptions, ProxyTarget};
use crate::upstream::TargetSource;

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Which requests are proxied and for how long.
    pub proxy: ProxySettings,

    /// Where the upstream lives and how to wait for it.
    pub upstream: UpstreamConfig,

    /// The handler that serves requests the upstream does not.
    pub fallback: FallbackConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GateConfig {
    pub fn gate_options(&self) -> GateOptions {
        GateOptions {
            path_prefix: self.proxy.path_prefix.clone(),
            request_timeout: Duration::from_secs(self.proxy.request_timeout_secs),
        }
    }

    /// How the upstream target is discovered.
    pub fn target_source(&self) -> Result<TargetSource, ResolveError> {
        let target = ProxyTarget::parse(&self.upstream.url)?;
        Ok(if self.upstream.wait_for_listener {
            TargetSource::WaitForListener {
                target,
                startup_timeout: Duration::from_secs(self.upstream.startup_timeout_secs),
            }
        } else {
            TargetSource::Static(target)
        })
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Gate settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Path prefix eligible for proxying ("/" proxies everything).
    pub path_prefix: String,

    /// Upper bound on one forwarding attempt, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            path_prefix: "/".to_string(),
            request_timeout_secs: 100,
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base address of the upstream (e.g., "http://127.0.0.1:5173").
    pub url: String,

    /// Hold requests until the upstream accepts TCP connections.
    pub wait_for_listener: bool,

    /// How long to wait for the upstream to start listening, in seconds.
    pub startup_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5173".to_string(),
            wait_for_listener: true,
            startup_timeout_secs: 120,
        }
    }
}

/// Fallback handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FallbackConfig {
    /// Directory of prebuilt static files. Without it, fallthrough is a 404.
    pub static_dir: Option<String>,

    /// File (relative to `static_dir`) served for paths with no file,
    /// e.g. "index.html" for client-side routed apps.
    pub spa_index: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
