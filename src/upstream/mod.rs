//! Upstream target discovery.
//!
//! The gate only awaits a [`TargetResolution`](crate::gate::TargetResolution);
//! this module produces one for the binary.
//!
//! # Design Decisions
//! - Probing starts at startup, not on the first request
//! - The probe has its own deadline; requests wait on it rather than
//!   re-probing

pub mod backoff;
pub mod discovery;

pub use discovery::{wait_for_listener, TargetSource};
