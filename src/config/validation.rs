//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: GateConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::gate::ProxyTarget;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("proxy.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("upstream.url is unusable: {0}")]
    UpstreamUrl(String),

    #[error("upstream.startup_timeout_secs must be greater than zero when waiting for the listener")]
    ZeroStartupTimeout,

    #[error("fallback.spa_index requires fallback.static_dir")]
    SpaIndexWithoutStaticDir,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.proxy.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if let Err(e) = ProxyTarget::parse(&config.upstream.url) {
        errors.push(ValidationError::UpstreamUrl(e.to_string()));
    }

    if config.upstream.wait_for_listener && config.upstream.startup_timeout_secs == 0 {
        errors.push(ValidationError::ZeroStartupTimeout);
    }

    if config.fallback.spa_index.is_some() && config.fallback.static_dir.is_none() {
        errors.push(ValidationError::SpaIndexWithoutStaticDir);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
