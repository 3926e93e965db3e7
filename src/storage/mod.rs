//! Counter storage for the rate limiter
//!
//! ## Module Structure
//!
//! - `redis` - Shared networked counter store
//! - `memory` - In-process fallback with the same contract
//! - `tests` - Module tests

mod memory;
mod redis;


pub use memory::MemoryCounterStore;
pub use redis::RedisCounterStore;

use crate::config::StoreConfig;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Remaining lifetime of a counter key.
///
/// Distinguishes "exists without expiry" from "does not exist", mirroring
/// the store's `TTL` sentinels, because the limiter reacts differently to
/// the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key exists and expires after this many whole seconds
    Remaining(u64),
    /// Key exists but carries no expiry
    NoExpiry,
    /// Key does not exist
    Missing,
}

impl KeyTtl {
    /// Map a raw `TTL` reply onto the sentinel-free representation
    /// (-1 = no expiry, -2 = missing).
    pub fn from_redis(raw: i64) -> Self {
        match raw {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::NoExpiry,
            secs => KeyTtl::Remaining(secs.max(0) as u64),
        }
    }
}

/// Shared counter with atomic increment and TTL-based expiry.
///
/// Implementations must keep `increment` atomic under concurrent callers
/// for the same key; the limiter's window semantics depend on never losing
/// an update.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically create the key at 1, or add 1; returns the new value.
    async fn increment(&self, key: &str) -> Result<i64>;

    /// Set (or overwrite) the key's expiry; returns whether the key existed.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remaining lifetime of the key.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Implementation name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Shared handle to the process-wide counter store.
pub type CounterHandle = Arc<dyn CounterStore>;

/// Connect the shared counter store, substituting the in-process fallback
/// when the shared one cannot be constructed.
///
/// The decision is made once at startup and never revisited per call;
/// callers depend only on the [`CounterStore`] trait and cannot tell which
/// variant is active. The fallback trades cross-instance consistency for
/// availability and is correct only for a single-process deployment.
pub async fn connect(config: &StoreConfig) -> CounterHandle {
    match RedisCounterStore::connect(config).await {
        Ok(store) => {
            info!("Connected to shared counter store");
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                "Shared counter store unavailable, using in-memory fallback: {}",
                e
            );
            Arc::new(MemoryCounterStore::new())
        }
    }
}
