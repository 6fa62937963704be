//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → gate aborts in-flight upstream calls
//!             → server stops accepting and drains
//! ```
//!
//! # Design Decisions
//! - One shutdown handle per process, cloned into every subsystem
//! - Observers that subscribe after the trigger still see it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
