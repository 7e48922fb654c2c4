//! Multi-provider refresh where the first success wins.
//!
//! One worker per provider fetches live rates concurrently and stores them.
//! A failing provider is logged and otherwise ignored; the refresh as a whole
//! only fails when no provider succeeded. All workers run to completion, so
//! the map ends up holding the union of every successful provider's rates.

use std::collections::HashSet;

use converter_common::{ConverterError, ProviderType, Result, Shutdown};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::memory::InMemoryStore;

/// Result of a refresh in which at least one provider succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Providers whose rates were stored, in completion order.
    pub refreshed: Vec<ProviderType>,
    /// Providers that could not be fetched or stored, in completion order.
    /// Providers whose worker panicked come last.
    pub failed: Vec<ProviderType>,
    /// Total rates written across all successful providers.
    pub rates_stored: usize,
}

/// What a single refresh worker reports back.
#[derive(Debug)]
enum WorkerOutcome {
    Refreshed { provider: ProviderType, stored: usize },
    Failed { provider: ProviderType },
}

impl InMemoryStore {
    /// Refresh rates from `providers`, one concurrent worker each.
    ///
    /// Duplicate identifiers are refreshed once. Dropping the returned future
    /// aborts the outstanding workers; every worker writes its rates in one
    /// locked section, so an aborted worker leaves no partial mapping behind.
    #[instrument(skip(self))]
    pub async fn refresh_from(&self, providers: &[ProviderType]) -> Result<RefreshSummary> {
        if providers.is_empty() {
            return Err(ConverterError::InvalidArgument(
                "no exchange providers to refresh".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut spawned = Vec::new();
        let mut workers = JoinSet::new();
        for &provider in providers {
            if !seen.insert(provider) {
                continue;
            }

            let store = self.clone();
            workers.spawn(async move { store.refresh_provider(provider).await });
            spawned.push(provider);
        }
        let attempted = spawned.len();

        let mut summary = RefreshSummary::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(WorkerOutcome::Refreshed { provider, stored }) => {
                    summary.refreshed.push(provider);
                    summary.rates_stored += stored;
                }
                Ok(WorkerOutcome::Failed { provider }) => summary.failed.push(provider),
                Err(e) => error!(error = %e, "Refresh worker aborted"),
            }
        }

        // A worker that panicked reported nothing
        for provider in spawned {
            if !summary.refreshed.contains(&provider) && !summary.failed.contains(&provider) {
                summary.failed.push(provider);
            }
        }

        if summary.refreshed.is_empty() {
            error!(attempted, "No exchange provider could be reached");
            return Err(ConverterError::NoProvidersReachable { attempted });
        }

        info!(
            refreshed = ?summary.refreshed,
            failed = ?summary.failed,
            rates_stored = summary.rates_stored,
            "Exchange rates refreshed"
        );
        Ok(summary)
    }

    /// [`refresh_from`](Self::refresh_from), abandoned when `shutdown` fires.
    ///
    /// Rates stored by workers that finished before the signal remain.
    pub async fn refresh_exchange_rates_until(
        &self,
        providers: &[ProviderType],
        mut shutdown: Shutdown,
    ) -> Result<RefreshSummary> {
        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                warn!("Exchange rate refresh abandoned on shutdown");
                Err(ConverterError::Cancelled("exchange rate refresh".to_string()))
            }
            result = self.refresh_from(providers) => result,
        }
    }

    async fn refresh_provider(&self, provider: ProviderType) -> WorkerOutcome {
        let fetched = match self.registry.get(provider) {
            Ok(upstream) => upstream.live_rates().await,
            Err(e) => Err(e),
        };

        let rates = match fetched {
            Ok(rates) => rates,
            Err(e) => {
                warn!(provider = %provider, error = %e, "Provider refresh failed");
                return WorkerOutcome::Failed { provider };
            }
        };

        match self.insert_rates(provider, &rates, self.config.rate_validity) {
            Ok(stored) => {
                debug!(provider = %provider, stored, "Stored refreshed rates");
                WorkerOutcome::Refreshed { provider, stored }
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to store refreshed rates");
                WorkerOutcome::Failed { provider }
            }
        }
    }
}
