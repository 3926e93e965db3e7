//! Fixed-window rate limiting
//!
//! Counts requests per client identity in fixed, non-overlapping windows
//! over the shared counter store. On store failure the limiter fails
//! open: for a non-critical demo gateway, serving traffic beats strict
//! enforcement while the store is down.
//!
//! Window boundaries are approximate under the in-process fallback store
//! (no compare-and-swap across increment + expire), so a client can in
//! rare interleavings squeeze slightly more than the limit into one
//! window. Accepted, not a correctness target.

#[cfg(test)]
mod tests;

use crate::config::RateLimitConfig;
use crate::storage::{CounterHandle, KeyTtl};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// Key prefix shared by every window counter.
const KEY_PREFIX: &str = "ratelimit:";

/// Per-request limiter verdict with the quota metadata response headers
/// need.
///
/// Derived on every check, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Configured requests-per-window limit
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window clears
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Window reset as epoch seconds, the shape 429 headers carry.
    pub fn reset_epoch_secs(&self) -> i64 {
        self.reset_at.timestamp()
    }
}

/// Fixed-window request counter keyed by client identity.
///
/// Limit and window length are fixed at construction; there is no runtime
/// reconfiguration.
pub struct RateLimiter {
    store: CounterHandle,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter over the given counter store.
    pub fn new(store: CounterHandle, config: &RateLimitConfig) -> Self {
        Self {
            store,
            limit: config.max_requests,
            window: config.window(),
        }
    }

    /// Count a request for `identity` and decide whether it may proceed.
    ///
    /// Never returns an error: a failing store yields an allow with one
    /// request charged rather than a refusal. Quota-exceeded is an
    /// explicit `allowed = false` decision, never conflated with store
    /// failures.
    pub async fn check(&self, identity: &str) -> RateLimitDecision {
        let key = format!("{KEY_PREFIX}{identity}");

        match self.consult_store(&key).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Counter store failed, rate limiter failing open: {}", e);
                RateLimitDecision {
                    allowed: true,
                    limit: self.limit,
                    remaining: self.limit.saturating_sub(1),
                    reset_at: window_end(self.window),
                }
            }
        }
    }

    async fn consult_store(&self, key: &str) -> Result<RateLimitDecision> {
        let count = self.store.increment(key).await?;

        let ttl = if count == 1 {
            // Fresh window: arm its expiry.
            self.store.expire(key, self.window).await?;
            self.window
        } else {
            match self.store.ttl(key).await? {
                KeyTtl::Remaining(secs) => Duration::from_secs(secs),
                // A prior expire failed or raced away; re-arm so the key
                // cannot persist unbounded.
                KeyTtl::NoExpiry | KeyTtl::Missing => {
                    self.store.expire(key, self.window).await?;
                    self.window
                }
            }
        };

        let allowed = count <= i64::from(self.limit);
        let remaining = (i64::from(self.limit) - count).max(0) as u32;

        if !allowed {
            debug!("Rate limit exceeded for {} (count {})", key, count);
        }

        Ok(RateLimitDecision {
            allowed,
            limit: self.limit,
            remaining,
            reset_at: window_end(ttl),
        })
    }
}

fn window_end(ttl: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64)
}
