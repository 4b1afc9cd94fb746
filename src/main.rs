//! Provider router daemon.
//!
//! Hosts the process-wide health registry and exposes it on the diagnostic
//! endpoint. Services embedding the library build their fallback executors
//! from the same registry.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller ──▶ FallbackExecutor ──▶ tier 1 (rich) ──▶ tier 2 (general) ──▶ tier 3 (basic)
//!                     │   ▲                  │
//!          try_acquire│   │record_*          ▼
//!                     ▼   │            TierTransport (external)
//!                 HealthRegistry ◀── best_order / snapshot ── diagnostic endpoint
//!              (stats + breaker + score per provider)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use provider_router::admin::{self, AdminState};
use provider_router::config::{load_config, RouterConfig};
use provider_router::health::HealthRegistry;
use provider_router::lifecycle::{self, signals, Shutdown};
use provider_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "provider-router")]
#[command(about = "Provider health registry and diagnostic endpoint", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "PROVIDER_ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "provider-router starting");
    tracing::info!(
        config_path = ?args.config,
        min_requests = config.health.min_requests,
        fail_rate_threshold = config.health.fail_rate_threshold,
        base_open_ms = config.health.base_open_ms,
        max_retries = config.retry.max_retries,
        providers = config.providers.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(HealthRegistry::new(config.health.clone()));
    for provider in &config.providers {
        registry.register(provider.id.as_str());
        tracing::info!(provider = %provider.id, tier = ?provider.tier, "Provider registered");
    }

    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            registry: registry.clone(),
            api_key: config.admin.api_key.clone(),
        };
        let signal = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, signal).await {
                tracing::error!(error = %e, "Diagnostic endpoint failed");
            }
        }));
    }

    signals::wait_for_shutdown_signal().await;
    shutdown.trigger();
    lifecycle::drain(tasks).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
