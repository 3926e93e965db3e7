//! Tests for the fixed-window rate limiter

use super::RateLimiter;
use crate::config::RateLimitConfig;
use crate::storage::{CounterStore, KeyTtl, MemoryCounterStore};
use crate::utils::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn limiter_with(limit: u32, window_secs: u64) -> RateLimiter {
    let config = RateLimitConfig {
        max_requests: limit,
        window_secs,
    };
    RateLimiter::new(Arc::new(MemoryCounterStore::new()), &config)
}

/// Store whose every operation fails, for exercising the fail-open path.
struct BrokenStore;

#[async_trait]
impl CounterStore for BrokenStore {
    async fn increment(&self, _key: &str) -> Result<i64> {
        Err(Error::Store("connection reset".to_string()))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        Err(Error::Store("connection reset".to_string()))
    }

    async fn ttl(&self, _key: &str) -> Result<KeyTtl> {
        Err(Error::Store("connection reset".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Wraps the memory store but drops the first `expire`, simulating a
/// window whose expiry never got armed.
struct DroppedExpireStore {
    inner: MemoryCounterStore,
    dropped: AtomicBool,
}

impl DroppedExpireStore {
    fn new() -> Self {
        Self {
            inner: MemoryCounterStore::new(),
            dropped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CounterStore for DroppedExpireStore {
    async fn increment(&self, key: &str) -> Result<i64> {
        self.inner.increment(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        if !self.dropped.swap(true, Ordering::SeqCst) {
            return Ok(true); // swallowed: key left without expiry
        }
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.inner.ttl(key).await
    }

    fn name(&self) -> &'static str {
        "dropped-expire"
    }
}

#[tokio::test]
async fn test_allows_up_to_limit_with_decreasing_remaining() {
    let limiter = limiter_with(5, 60);

    for expected_remaining in (0..5).rev() {
        let decision = limiter.check("client-a").await;
        assert!(decision.allowed);
        assert_eq!(decision.limit, 5);
        assert_eq!(decision.remaining, expected_remaining);
    }
}

#[tokio::test]
async fn test_denies_over_limit_with_zero_remaining() {
    let limiter = limiter_with(3, 60);

    for _ in 0..3 {
        assert!(limiter.check("client-a").await.allowed);
    }

    let denied = limiter.check("client-a").await;
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);

    // Still denied on further calls inside the same window.
    assert!(!limiter.check("client-a").await.allowed);
}

#[tokio::test]
async fn test_identities_do_not_share_counters() {
    let limiter = limiter_with(2, 60);

    limiter.check("client-a").await;
    limiter.check("client-a").await;
    assert!(!limiter.check("client-a").await.allowed);

    let other = limiter.check("client-b").await;
    assert!(other.allowed);
    assert_eq!(other.remaining, 1);
}

#[tokio::test]
async fn test_window_expiry_starts_fresh_window() {
    let limiter = limiter_with(1, 1);

    assert!(limiter.check("client-a").await.allowed);
    assert!(!limiter.check("client-a").await.allowed);

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let fresh = limiter.check("client-a").await;
    assert!(fresh.allowed);
    assert_eq!(fresh.remaining, 0);
}

#[tokio::test]
async fn test_fails_open_when_store_errors() {
    let config = RateLimitConfig {
        max_requests: 10,
        window_secs: 60,
    };
    let limiter = RateLimiter::new(Arc::new(BrokenStore), &config);

    let before = Utc::now();
    let decision = limiter.check("client-a").await;

    assert!(decision.allowed);
    assert_eq!(decision.remaining, 9);
    // Reset one full window ahead.
    let expected_reset = before + chrono::Duration::seconds(60);
    let drift = (decision.reset_at - expected_reset).num_seconds().abs();
    assert!(drift <= 1);

    // Every call keeps failing open; none of them panics or errors out.
    for _ in 0..20 {
        assert!(limiter.check("client-a").await.allowed);
    }
}

#[tokio::test]
async fn test_rearms_expiry_when_window_lost_its_ttl() {
    let store = Arc::new(DroppedExpireStore::new());
    let config = RateLimitConfig {
        max_requests: 10,
        window_secs: 60,
    };
    let limiter = RateLimiter::new(Arc::clone(&store) as Arc<dyn CounterStore>, &config);

    // First check arms the expiry, but the store drops it.
    limiter.check("client-a").await;
    assert_eq!(
        store.ttl("ratelimit:client-a").await.unwrap(),
        KeyTtl::NoExpiry
    );

    // Second check notices and re-arms defensively.
    let decision = limiter.check("client-a").await;
    assert!(decision.allowed);
    match store.ttl("ratelimit:client-a").await.unwrap() {
        KeyTtl::Remaining(secs) => assert!((59..=60).contains(&secs)),
        other => panic!("expiry not re-armed: {:?}", other),
    }
}

#[tokio::test]
async fn test_reset_epoch_secs_matches_reset_at() {
    let limiter = limiter_with(10, 60);
    let decision = limiter.check("client-a").await;
    assert_eq!(decision.reset_epoch_secs(), decision.reset_at.timestamp());
    assert!(decision.reset_epoch_secs() > Utc::now().timestamp());
}
