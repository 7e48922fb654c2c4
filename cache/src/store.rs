//! Rate store contract and configuration.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use converter_common::{constants, ProviderType, Result};

use crate::refresh::RefreshSummary;

/// Configuration for a rate store.
#[derive(Debug, Clone)]
pub struct RateStoreConfig {
    /// Validity of rates stored by lookups and refreshes.
    pub rate_validity: Duration,
    /// Validity of cached currency lists.
    pub currencies_validity: Duration,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for RateStoreConfig {
    fn default() -> Self {
        Self {
            rate_validity: constants::default_rate_validity(),
            currencies_validity: constants::currencies_validity(),
            max_entries: 100_000,
        }
    }
}

/// Holds exchange rates and currency lists per provider.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Currency codes supported by `provider`, fetched from it on a miss.
    async fn available_currencies(&self, provider: ProviderType) -> Result<Vec<String>>;

    /// Store a provider's currency list. Fails on an empty list.
    fn set_available_currencies(&self, provider: ProviderType, codes: Vec<String>) -> Result<()>;

    /// Rate for `currency_code` from `provider`, fetched from it on a miss.
    ///
    /// Returns a not-found error if the provider has no rate for the code.
    async fn get_exchange_rate(&self, currency_code: &str, provider: ProviderType) -> Result<f32>;

    /// Store a rate, overwriting any previous one for the same key.
    fn set_exchange_rate(
        &self,
        currency_code: &str,
        provider: ProviderType,
        rate: f32,
        validity: Duration,
    ) -> Result<()>;

    /// Fetch live rates from every listed provider concurrently.
    ///
    /// Succeeds if at least one provider succeeded.
    async fn refresh_exchange_rates(&self, providers: &[ProviderType]) -> Result<RefreshSummary>;

    /// Remove every expired entry.
    fn cleanup_all_expired(&self);
}

/// Shared store handle.
pub type SharedRateStore = Arc<dyn RateStore>;

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
