//! In-process counter store fallback
//!
//! Same contract as the shared store, backed by a local map with lazy
//! expiry. Window atomicity holds only within this process, so limits are
//! enforced per instance while this variant is active.

use super::{CounterStore, KeyTtl};
use crate::utils::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Counter store backed by an in-process map.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at: None,
        });
        entry.value += 1;
        Ok(entry.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let now = Instant::now();
        let entries = self.entries.lock();
        match entries.get(key) {
            None => Ok(KeyTtl::Missing),
            Some(entry) if entry.is_expired(now) => Ok(KeyTtl::Missing),
            Some(Entry {
                expires_at: None, ..
            }) => Ok(KeyTtl::NoExpiry),
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => {
                // Round up like the networked store's TTL primitive does.
                let millis = at.duration_since(now).as_millis() as u64;
                Ok(KeyTtl::Remaining(millis.div_ceil(1_000)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
