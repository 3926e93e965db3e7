//! Smoke entry point for the gateway core
//!
//! Wires the components from the environment, runs one availability probe
//! and a short burst of rate-limit checks, and reports what happened.

use promptgate::{Config, PromptGate};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> promptgate::Result<()> {
    let config = Config::from_env()?;
    let gate = PromptGate::new(config).await?;

    info!("Counter store: {}", gate.store_name());

    let health = gate.monitor().check_now().await;
    if health.is_available {
        info!("Backend available");
    } else {
        warn!(
            "Backend unavailable: {}",
            health.last_error.as_deref().unwrap_or("not yet checked")
        );
    }

    for _ in 0..3 {
        let decision = gate.limiter().check("smoke-test").await;
        info!(
            "Rate limit check: allowed={} remaining={} resets_at={}",
            decision.allowed, decision.remaining, decision.reset_at
        );
    }

    Ok(())
}
