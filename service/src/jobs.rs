//! Periodic cache maintenance.

use std::time::Duration;

use converter_cache::SharedRateStore;
use converter_common::{ProviderType, Shutdown};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Sweep expired entries every `period` until shutdown.
pub async fn run_cache_cleaner(store: SharedRateStore, period: Duration, mut shutdown: Shutdown) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    info!(?period, "Cache cleaner started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            _ = ticker.tick() => store.cleanup_all_expired(),
        }
    }
    info!("Cache cleaner stopped");
}

/// Refresh rates from `providers` every `period` until shutdown.
///
/// A failed refresh is logged and retried on the next tick. A refresh still
/// running at shutdown is abandoned.
pub async fn run_rates_refresher(
    store: SharedRateStore,
    providers: Vec<ProviderType>,
    period: Duration,
    mut shutdown: Shutdown,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!(?period, ?providers, "Exchange rates refresher started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            result = store.refresh_exchange_rates(&providers) => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to refresh exchange rates");
                }
            }
        }
    }
    info!("Exchange rates refresher stopped");
}
