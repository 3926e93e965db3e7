//! Exponential backoff scheduling
//!
//! One shared implementation used by both the availability monitor (to
//! scale its poll interval) and the resilient request executor (to scale
//! the delay between retries), so the two cannot drift apart.

use std::time::Duration;

/// Compute the backoff delay for `attempt`, doubling from `base` and
/// capped at `max`.
///
/// `attempt = 0` yields `base`; each further attempt doubles the delay
/// until the cap is reached. Saturates instead of overflowing for very
/// large attempt numbers.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let millis = (base.as_millis() as u64).saturating_mul(factor);
    Duration::from_millis(millis).min(max)
}

/// [`backoff_delay`] with up to ±5% random jitter, still capped at `max`.
///
/// Jitter spreads retries from concurrent callers apart; it is opt-in and
/// off by default.
pub fn jittered_backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let delay = backoff_delay(attempt, base, max);
    let jitter = delay.as_millis() as f64 * 0.1 * (rand::random::<f64>() - 0.5);
    let millis = (delay.as_millis() as f64 + jitter).max(0.0) as u64;
    Duration::from_millis(millis).min(max)
}
