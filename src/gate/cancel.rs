//! Composite cancellation for one forwarding attempt.
//!
//! # Responsibilities
//! - Race the request timeout, process shutdown and caller disconnect
//! - Report which source fired first
//!
//! # Design Decisions
//! - Shutdown wins ties, then the caller, then the deadline
//! - The caller source is a token cancelled by a drop guard held in the
//!   inbound request future, so a dropped future aborts spawned upstream work

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why an in-flight upstream operation was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The per-request timeout elapsed.
    Timeout,
    /// The process is shutting down.
    Shutdown,
    /// The inbound caller went away.
    CallerGone,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            CancelReason::Timeout => "request timeout elapsed",
            CancelReason::Shutdown => "shutting down",
            CancelReason::CallerGone => "caller disconnected",
        };
        f.write_str(reason)
    }
}

/// Token for the caller source plus the guard that fires it on drop.
pub fn caller_token() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

/// Aggregates the cancellation sources of one request.
#[derive(Debug, Clone)]
pub struct CancelScope {
    deadline: Instant,
    shutdown: CancellationToken,
    caller: Option<CancellationToken>,
}

impl CancelScope {
    /// Scope whose deadline starts now.
    pub fn new(timeout: Duration, shutdown: CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            shutdown,
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: CancellationToken) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Same deadline and shutdown, without the caller source.
    ///
    /// Used once a response is handed to the server: from then on the server
    /// drops the body itself when the caller disconnects.
    pub fn detached(&self) -> Self {
        Self {
            caller: None,
            ..self.clone()
        }
    }

    /// The reason this scope is already cancelled, if any.
    pub fn check(&self) -> Option<CancelReason> {
        if self.shutdown.is_cancelled() {
            Some(CancelReason::Shutdown)
        } else if self.caller.as_ref().is_some_and(|c| c.is_cancelled()) {
            Some(CancelReason::CallerGone)
        } else if Instant::now() >= self.deadline {
            Some(CancelReason::Timeout)
        } else {
            None
        }
    }

    /// Resolves with the first source to fire.
    pub async fn cancelled(&self) -> CancelReason {
        let caller = async {
            match &self.caller {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => CancelReason::Shutdown,
            _ = caller => CancelReason::CallerGone,
            _ = tokio::time::sleep_until(self.deadline) => CancelReason::Timeout,
        }
    }

    /// Owned variant of [`CancelScope::cancelled`] for storing in a body.
    pub fn into_cancelled(self) -> Pin<Box<dyn Future<Output = CancelReason> + Send>> {
        Box::pin(async move { self.cancelled().await })
    }

    /// Run `fut` unless the scope fires first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, CancelReason> {
        tokio::select! {
            biased;
            reason = self.cancelled() => Err(reason),
            output = fut => Ok(output),
        }
    }
}
