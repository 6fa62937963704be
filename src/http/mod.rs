//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → gate (proxy or fall through)
//!     → fallback handler (static files / 404)
//! ```

pub mod server;

pub use server::GateServer;
