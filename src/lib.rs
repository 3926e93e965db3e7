//! # promptgate
//!
//! Rate limiting and resilience core for an LLM-backed demo gateway.
//!
//! The crate gates calls to an externally billed LLM endpoint behind a
//! fixed-window rate limiter over a shared counter store (with a
//! transparent in-process fallback), watches a dependent backend's health
//! with exponential-backoff probing, and issues outbound provider calls
//! through a bounded-retry HTTP executor. HTTP routing, request
//! validation, and the provider's wire format stay outside; this is the
//! coordination core those layers call into.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptgate::{Config, PromptGate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let gate = PromptGate::new(config).await?;
//!     gate.start();
//!
//!     let decision = gate.limiter().check("1.2.3.4").await;
//!     if decision.allowed {
//!         // forward the prompt upstream through gate.client()
//!     } else {
//!         // answer 429 with decision.limit / remaining / reset_epoch_secs()
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod limiter;
pub mod monitoring;
pub mod storage;
pub mod utils;

pub use client::{RequestSpec, ResilientClient};
pub use config::Config;
pub use limiter::{RateLimitDecision, RateLimiter};
pub use monitoring::{AvailabilityMonitor, AvailabilityState, ProbeStatus};
pub use storage::{CounterHandle, CounterStore, KeyTtl, MemoryCounterStore, RedisCounterStore};
pub use utils::error::{Error, Result};

use std::sync::Arc;
use tracing::info;

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Composition root owning the process-wide singletons.
///
/// The counter store connection, limiter, monitor, and outbound client are
/// each constructed exactly once here and handed out as shared handles;
/// components never reach for hidden globals.
pub struct PromptGate {
    config: Config,
    store: CounterHandle,
    limiter: RateLimiter,
    monitor: Arc<AvailabilityMonitor>,
    client: ResilientClient,
}

impl PromptGate {
    /// Wire the core from configuration.
    ///
    /// The counter store connection is attempted once; an unreachable
    /// store downgrades to the in-process fallback instead of failing
    /// construction. Invalid configuration does fail here, before
    /// anything runs.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let store = storage::connect(&config.store).await;
        info!("Rate limit counters served by the {} store", store.name());

        let limiter = RateLimiter::new(Arc::clone(&store), &config.limiter);
        let monitor = Arc::new(AvailabilityMonitor::new(&config.monitor)?);
        let client = ResilientClient::new(&config.retry)?;

        Ok(Self {
            config,
            store,
            limiter,
            monitor,
            client,
        })
    }

    /// Start background work (the availability probe loop).
    pub fn start(&self) {
        self.monitor.start();
    }

    /// Stop background work.
    pub fn stop(&self) {
        self.monitor.stop();
    }

    /// The rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The availability monitor.
    pub fn monitor(&self) -> &Arc<AvailabilityMonitor> {
        &self.monitor
    }

    /// The outbound request executor.
    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    /// The configuration the core was wired from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Which counter store variant ended up active.
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}
