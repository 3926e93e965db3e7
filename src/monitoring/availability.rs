//! Health probing for the dependent backend service
//!
//! One monitor owns the availability state for one dependency. The probe
//! loop widens its own polling interval geometrically while the dependency
//! stays down and snaps back to the base interval on the first success.
//! The state informs status surfaces only; it never gates the limiter.

use crate::config::MonitorConfig;
use crate::utils::backoff::backoff_delay;
use crate::utils::error::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Probe lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// No probe has completed yet
    Unchecked,
    /// A probe is in flight
    Checking,
    /// Last probe succeeded
    Available,
    /// Last probe failed
    Unavailable,
}

/// Snapshot of the dependency's observed health.
///
/// Mutated only by the monitor's own probe logic; everything else gets a
/// read-only copy.
#[derive(Debug, Clone)]
pub struct AvailabilityState {
    /// Where the probe state machine currently sits
    pub status: ProbeStatus,
    /// Whether the dependency answered its last probe
    pub is_available: bool,
    /// When the last probe completed
    pub last_checked_at: Option<DateTime<Utc>>,
    /// What the last failed probe reported
    pub last_error: Option<String>,
    /// Failed probes since the last success
    pub consecutive_failures: u32,
    /// Delay before the next scheduled probe
    pub poll_interval: Duration,
}

impl AvailabilityState {
    fn new(base_interval: Duration) -> Self {
        Self {
            status: ProbeStatus::Unchecked,
            // Pessimistic until the first probe lands.
            is_available: false,
            last_checked_at: None,
            last_error: None,
            consecutive_failures: 0,
            poll_interval: base_interval,
        }
    }

    fn record_success(&mut self, config: &MonitorConfig) {
        self.status = ProbeStatus::Available;
        self.is_available = true;
        self.last_checked_at = Some(Utc::now());
        self.last_error = None;
        self.consecutive_failures = 0;
        self.poll_interval = config.base_interval();
    }

    fn record_failure(&mut self, error: String, config: &MonitorConfig) {
        self.status = ProbeStatus::Unavailable;
        self.is_available = false;
        self.last_checked_at = Some(Utc::now());
        self.last_error = Some(error);
        self.consecutive_failures += 1;
        self.poll_interval = backoff_delay(
            self.consecutive_failures,
            config.base_interval(),
            config.max_interval(),
        );
    }
}

/// Periodically probes one dependency's health endpoint.
pub struct AvailabilityMonitor {
    http: reqwest::Client,
    health_url: String,
    config: MonitorConfig,
    state: RwLock<AvailabilityState>,
    /// Held for the duration of a probe so triggers cannot overlap.
    probe_guard: tokio::sync::Mutex<()>,
    active: AtomicBool,
}

impl AvailabilityMonitor {
    /// Create a monitor for the configured health endpoint.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.probe_timeout())
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self {
            http,
            health_url: config.health_url.clone(),
            config: config.clone(),
            state: RwLock::new(AvailabilityState::new(config.base_interval())),
            probe_guard: tokio::sync::Mutex::new(()),
            active: AtomicBool::new(false),
        })
    }

    /// Current state snapshot; read-only outside the monitor.
    pub fn state(&self) -> AvailabilityState {
        self.state.read().clone()
    }

    /// Spawn the background probe loop. The first probe runs immediately;
    /// each later probe waits the interval the previous outcome chose.
    pub fn start(self: &Arc<Self>) {
        if self.active.swap(true, Ordering::AcqRel) {
            return; // already running
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            debug!("Availability monitor started for {}", monitor.health_url);
            while monitor.active.load(Ordering::Acquire) {
                monitor.check_now().await;
                let interval = monitor.state.read().poll_interval;
                tokio::time::sleep(interval).await;
            }
            debug!("Availability monitor stopped");
        });
    }

    /// Stop the background loop after its current sleep.
    pub fn stop(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Probe immediately (manual trigger).
    ///
    /// If a probe is already in flight, the duplicate trigger is a no-op
    /// that returns the current snapshot instead of starting a second
    /// concurrent probe.
    pub async fn check_now(&self) -> AvailabilityState {
        let Ok(_guard) = self.probe_guard.try_lock() else {
            debug!("Probe already in flight, ignoring duplicate trigger");
            return self.state();
        };

        self.state.write().status = ProbeStatus::Checking;

        match self.probe().await {
            Ok(()) => {
                debug!("Backend health probe succeeded");
                self.state.write().record_success(&self.config);
            }
            Err(reason) => {
                let mut state = self.state.write();
                state.record_failure(reason, &self.config);
                warn!(
                    "Backend health probe failed ({} consecutive), next probe in {:?}: {}",
                    state.consecutive_failures,
                    state.poll_interval,
                    state.last_error.as_deref().unwrap_or("unknown"),
                );
            }
        }

        self.state()
    }

    /// One bounded-timeout GET against the health endpoint. The timeout
    /// baked into the client keeps a stuck probe from hanging the loop.
    async fn probe(&self) -> std::result::Result<(), String> {
        match self.http.get(&self.health_url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(format!("health endpoint returned {}", response.status())),
            Err(e) if e.is_timeout() => Err("health probe timed out".to_string()),
            Err(e) => Err(format!("health probe failed: {e}")),
        }
    }
}
