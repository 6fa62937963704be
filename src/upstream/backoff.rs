//! Delay schedule for the listener readiness probe.
//!
//! Steps double from [`PROBE_BASE_DELAY`] up to [`PROBE_MAX_DELAY`], carry up
//! to 10% jitter and never overshoot the probe deadline.

use std::time::Duration;

use rand::Rng;

pub const PROBE_BASE_DELAY: Duration = Duration::from_millis(50);
pub const PROBE_MAX_DELAY: Duration = Duration::from_secs(1);

/// Delay before probe attempt `attempt + 1`, clamped to `remaining`.
///
/// Returns `None` once nothing is left before the deadline.
pub fn next_probe_delay(attempt: u32, remaining: Duration) -> Option<Duration> {
    if remaining.is_zero() {
        return None;
    }

    let step = PROBE_BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .min(PROBE_MAX_DELAY);
    let jitter = rand::thread_rng().gen_range(Duration::ZERO..=step / 10);

    Some((step + jitter).min(remaining))
}
