//! Conditional proxy gate.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs (prefix check)
//!     → executor.rs (await target, translate, send under cancel scope)
//!         → 404  → next handler gets the request
//!         → else → response streamed back (body.rs)
//! ```
//!
//! # Design Decisions
//! - Only an explicit upstream 404 falls through; every other failure is
//!   an error response
//! - Target resolution and the connection pool are created once per gate

pub mod body;
pub mod cancel;
pub mod executor;
pub mod headers;
pub mod middleware;
pub mod prefix;
pub mod target;

pub use cancel::{CancelReason, CancelScope};
pub use executor::{ProxyExecutor, ProxyOutcome};
pub use middleware::{conditional_proxy_middleware, ConditionalProxy, GateOptions};
pub use prefix::PathPrefix;
pub use target::{ProxyTarget, TargetResolution};
