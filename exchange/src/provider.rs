//! Exchange provider capability.

use async_trait::async_trait;
use converter_common::{ProviderType, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Live rates keyed by currency code.
pub type Rates = HashMap<String, f32>;

/// Trait for upstream exchange rate sources.
///
/// Implementations are interchangeable; callers select among them purely by
/// [`ProviderType`].
#[async_trait]
pub trait ExchangeProvider: Send + Sync {
    /// Which provider this is.
    fn provider_type(&self) -> ProviderType;

    /// Fetch live rates for every currency the provider supports.
    async fn live_rates(&self) -> Result<Rates>;

    /// List the currency codes the provider supports.
    async fn currencies(&self) -> Result<Vec<String>>;
}

/// Shared provider handle.
pub type SharedProvider = Arc<dyn ExchangeProvider>;

/// Scriptable provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockExchangeProvider {
    provider_type: ProviderType,
    rates: parking_lot::Mutex<Rates>,
    currencies: parking_lot::Mutex<Vec<String>>,
    failure: parking_lot::Mutex<Option<converter_common::ConverterError>>,
    latency: parking_lot::Mutex<Option<std::time::Duration>>,
    live_rates_calls: std::sync::atomic::AtomicUsize,
    currencies_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockExchangeProvider {
    /// Create a new mock with no rates and no currencies.
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            rates: parking_lot::Mutex::new(Rates::new()),
            currencies: parking_lot::Mutex::new(Vec::new()),
            failure: parking_lot::Mutex::new(None),
            latency: parking_lot::Mutex::new(None),
            live_rates_calls: std::sync::atomic::AtomicUsize::new(0),
            currencies_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the rate returned for a currency code.
    pub fn set_rate(&self, code: impl Into<String>, rate: f32) {
        self.rates.lock().insert(code.into(), rate);
    }

    /// Set the currency list.
    pub fn set_currencies(&self, codes: &[&str]) {
        *self.currencies.lock() = codes.iter().map(|c| c.to_string()).collect();
    }

    /// Make every call fail with the given error until cleared.
    pub fn fail_with(&self, error: converter_common::ConverterError) {
        *self.failure.lock() = Some(error);
    }

    /// Stop failing.
    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Delay every call by `latency`.
    pub fn with_latency(self, latency: std::time::Duration) -> Self {
        *self.latency.lock() = Some(latency);
        self
    }

    /// Number of `live_rates` calls so far.
    pub fn live_rates_calls(&self) -> usize {
        self.live_rates_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of `currencies` calls so far.
    pub fn currencies_calls(&self) -> usize {
        self.currencies_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn simulate_call(&self) -> Result<()> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl ExchangeProvider for MockExchangeProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    async fn live_rates(&self) -> Result<Rates> {
        self.live_rates_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.simulate_call().await?;
        Ok(self.rates.lock().clone())
    }

    async fn currencies(&self) -> Result<Vec<String>> {
        self.currencies_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.simulate_call().await?;
        Ok(self.currencies.lock().clone())
    }
}
