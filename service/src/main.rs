//! Currency Converter Binary
//!
//! Runs the rate cache and its background jobs until interrupted.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use converter_cache::{InMemoryStore, SharedRateStore};
use converter_common::shutdown_channel;
use converter_exchange::ProviderRegistry;
use converter_service::jobs::{run_cache_cleaner, run_rates_refresher};
use converter_service::{ConverterService, ServiceConfig};

/// Currency converter service
#[derive(Parser, Debug)]
#[command(name = "converter")]
#[command(about = "Currency converter with a cached exchange rate store")]
struct Args {
    /// Seconds between expiry sweeps (overrides CONVERTER_CLEANUP_INTERVAL_SECS)
    #[arg(long)]
    cleanup_interval: Option<u64>,

    /// Seconds between rate refreshes (overrides CONVERTER_REFRESH_INTERVAL_SECS)
    #[arg(long)]
    refresh_interval: Option<u64>,

    /// Refresh rates and list the default provider's currencies at startup
    #[arg(long)]
    warm_up: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config =
        ServiceConfig::from_env().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(secs) = args.cleanup_interval {
        config.cleanup_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.refresh_interval {
        config.refresh_interval = Duration::from_secs(secs);
    }

    // Initialize logging
    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(fmt_layer)
        .init();

    info!("Starting currency converter");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let registry = Arc::new(ProviderRegistry::with_defaults());
    let memory = Arc::new(InMemoryStore::with_config(registry, config.store_config()));
    let store: SharedRateStore = memory.clone();
    let service = ConverterService::new(store.clone(), config.default_provider);

    let (trigger, shutdown) = shutdown_channel();

    // Set up graceful shutdown
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
        trigger.trigger();
    });

    if args.warm_up {
        match memory
            .refresh_exchange_rates_until(&config.providers, shutdown.clone())
            .await
        {
            Ok(summary) => info!(refreshed = ?summary.refreshed, "Cache warmed up"),
            Err(e) => error!(error = %e, "Warm-up refresh failed"),
        }
        match service.available_currencies(None).await {
            Ok(codes) => info!(currencies = codes.len(), "Currency list cached"),
            Err(e) => warn!(error = %e, "Currency list unavailable"),
        }
    }

    let cleaner = tokio::spawn(run_cache_cleaner(
        store.clone(),
        config.cleanup_interval,
        shutdown.clone(),
    ));
    let refresher = tokio::spawn(run_rates_refresher(
        store.clone(),
        config.providers.clone(),
        config.refresh_interval,
        shutdown,
    ));

    info!(
        default_provider = %config.default_provider,
        providers = ?config.providers,
        cleanup_interval = ?config.cleanup_interval,
        refresh_interval = ?config.refresh_interval,
        "Currency converter running"
    );

    let (cleaner, refresher) = tokio::join!(cleaner, refresher);
    cleaner?;
    refresher?;

    info!(stats = ?memory.stats(), "Currency converter shutdown complete");
    Ok(())
}
