//! Conditional reverse-proxy gate.
//!
//! Forwards eligible requests to an upstream (typically a dev server) and
//! falls through to the next handler when the upstream answers 404.

pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::GateConfig;
pub use error::{ProxyError, ResolveError};
pub use gate::{ConditionalProxy, GateOptions, ProxyOutcome, ProxyTarget, TargetResolution};
pub use http::GateServer;
pub use lifecycle::Shutdown;
