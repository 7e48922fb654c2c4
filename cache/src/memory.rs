//! In-memory rate store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use converter_common::{now, ConverterError, ProviderType, Result};
use converter_exchange::{ProviderRegistry, Rates};
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use crate::entry::{CacheEntry, CachedValue};
use crate::flight::FlightGroup;
use crate::key::{cache_key, currencies_key};
use crate::refresh::RefreshSummary;
use crate::store::{CacheStats, RateStore, RateStoreConfig};

type Items = HashMap<String, CacheEntry>;

/// Process-local rate store guarded by a single reader/writer lock.
///
/// Cloning is cheap and every clone shares the same map. Provider calls are
/// made without the lock held; the lock only covers map reads and writes.
#[derive(Clone)]
pub struct InMemoryStore {
    pub(crate) items: Arc<RwLock<Items>>,
    /// Rate fetches in progress, keyed by cache key.
    rate_flights: Arc<FlightGroup<f32>>,
    /// Currency listings in progress, keyed by cache key.
    currency_flights: Arc<FlightGroup<Vec<String>>>,
    pub(crate) registry: Arc<ProviderRegistry>,
    pub(crate) config: RateStoreConfig,
}

impl InMemoryStore {
    /// Create a store with default configuration.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self::with_config(registry, RateStoreConfig::default())
    }

    /// Create a store with custom configuration.
    pub fn with_config(registry: Arc<ProviderRegistry>, config: RateStoreConfig) -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            rate_flights: Arc::new(FlightGroup::new()),
            currency_flights: Arc::new(FlightGroup::new()),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &RateStoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Whether an unexpired rate is cached for the pair.
    pub fn contains_rate(&self, currency_code: &str, provider: ProviderType) -> bool {
        self.cached(&cache_key(currency_code, provider)).is_some()
    }

    /// Whether an unexpired currency list is cached for the provider.
    pub fn contains_currencies(&self, provider: ProviderType) -> bool {
        self.cached(&currencies_key(provider)).is_some()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = now();
        let items = self.items.read();
        let valid = items.values().filter(|e| !e.is_expired_at(now)).count();

        CacheStats {
            total_entries: items.len(),
            valid_entries: valid,
            expired_entries: items.len() - valid,
        }
    }

    /// Unexpired entry under `key`. Expired entries awaiting the sweep are misses.
    fn cached(&self, key: &str) -> Option<CacheEntry> {
        let items = self.items.read();
        items
            .get(key)
            .filter(|entry| !entry.is_expired())
            .cloned()
    }

    fn cached_rate(&self, key: &str) -> Option<f32> {
        self.cached(key).and_then(|entry| entry.rate())
    }

    fn cached_currencies(&self, key: &str) -> Option<Vec<String>> {
        self.cached(key)
            .and_then(|entry| entry.currencies().map(|codes| codes.to_vec()))
    }

    /// Miss path for a rate: one provider call shared by every concurrent caller.
    async fn fetch_rate(&self, key: &str, currency_code: &str, provider: ProviderType) -> Result<f32> {
        // A flight that finished just before this one started may have stored it
        if let Some(rate) = self.cached_rate(key) {
            debug!("Populated by concurrent lookup");
            return Ok(rate);
        }

        debug!("Cache miss, fetching live rates");
        let rates = match self.registry.get(provider) {
            Ok(upstream) => upstream.live_rates().await,
            Err(e) => Err(e),
        }
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch live rates");
            ConverterError::Upstream {
                provider,
                reason: e.to_string(),
            }
        })?;

        let stored = self.insert_rates(provider, &rates, self.config.rate_validity)?;
        debug!(stored, "Stored live rates");

        rates.get(currency_code).copied().ok_or_else(|| {
            ConverterError::NotFound(format!(
                "no {} rate from provider {}",
                currency_code, provider
            ))
        })
    }

    async fn fetch_currencies(&self, key: &str, provider: ProviderType) -> Result<Vec<String>> {
        if let Some(codes) = self.cached_currencies(key) {
            debug!("Populated by concurrent lookup");
            return Ok(codes);
        }

        debug!("Cache miss, listing currencies from provider");
        let codes = self.registry.get(provider)?.currencies().await?;
        self.set_available_currencies(provider, codes.clone())?;

        Ok(codes)
    }

    fn insert(&self, key: String, entry: CacheEntry) -> Result<()> {
        let mut items = self.items.write();
        insert_locked(&mut items, key, entry, self.config.max_entries)
    }

    /// Store every rate of one provider in a single write-locked section.
    ///
    /// On a capacity failure the rates written before it remain.
    pub(crate) fn insert_rates(
        &self,
        provider: ProviderType,
        rates: &Rates,
        validity: Duration,
    ) -> Result<usize> {
        let mut items = self.items.write();
        for (code, rate) in rates {
            let entry = CacheEntry::new(CachedValue::Rate(*rate), validity);
            insert_locked(
                &mut items,
                cache_key(code, provider),
                entry,
                self.config.max_entries,
            )?;
        }
        Ok(rates.len())
    }
}

/// Insert under an already held write lock, evicting expired entries when full.
fn insert_locked(items: &mut Items, key: String, entry: CacheEntry, max_entries: usize) -> Result<()> {
    if !items.contains_key(&key) && items.len() >= max_entries {
        let now = now();
        items.retain(|_, existing| !existing.is_expired_at(now));

        if items.len() >= max_entries {
            return Err(ConverterError::InternalCache(format!(
                "cache is full ({} entries)",
                max_entries
            )));
        }
    }

    items.insert(key, entry);
    Ok(())
}

#[async_trait]
impl RateStore for InMemoryStore {
    #[instrument(skip(self), fields(provider = %provider))]
    async fn available_currencies(&self, provider: ProviderType) -> Result<Vec<String>> {
        let key = currencies_key(provider);
        if let Some(codes) = self.cached_currencies(&key) {
            debug!("Cache hit");
            return Ok(codes);
        }

        self.currency_flights
            .run(&key, || self.fetch_currencies(&key, provider))
            .await
    }

    fn set_available_currencies(&self, provider: ProviderType, codes: Vec<String>) -> Result<()> {
        if codes.is_empty() {
            return Err(ConverterError::InvalidArgument(format!(
                "empty currency list for provider {}",
                provider
            )));
        }

        let entry = CacheEntry::new(CachedValue::Currencies(codes), self.config.currencies_validity);
        self.insert(currencies_key(provider), entry)
    }

    #[instrument(skip(self), fields(provider = %provider))]
    async fn get_exchange_rate(&self, currency_code: &str, provider: ProviderType) -> Result<f32> {
        let key = cache_key(currency_code, provider);
        if let Some(rate) = self.cached_rate(&key) {
            debug!("Cache hit");
            return Ok(rate);
        }

        self.rate_flights
            .run(&key, || self.fetch_rate(&key, currency_code, provider))
            .await
    }

    fn set_exchange_rate(
        &self,
        currency_code: &str,
        provider: ProviderType,
        rate: f32,
        validity: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(CachedValue::Rate(rate), validity);
        self.insert(cache_key(currency_code, provider), entry)
    }

    async fn refresh_exchange_rates(&self, providers: &[ProviderType]) -> Result<RefreshSummary> {
        self.refresh_from(providers).await
    }

    fn cleanup_all_expired(&self) {
        let removed = self.sweep_expired(now());
        debug!(removed, "Expired entries cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converter_exchange::MockExchangeProvider;
    use std::time::Duration as StdDuration;

    fn setup_store(mock: Arc<MockExchangeProvider>) -> InMemoryStore {
        let registry = ProviderRegistry::new().with_provider(mock);
        InMemoryStore::new(Arc::new(registry))
    }

    fn fixer_mock() -> Arc<MockExchangeProvider> {
        let mock = MockExchangeProvider::new(ProviderType::Fixer);
        mock.set_rate("USD", 1.1);
        mock.set_rate("EUR", 0.9);
        mock.set_currencies(&["USD", "EUR"]);
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_get_exchange_rate_cache_aside() {
        let mock = fixer_mock();
        let store = setup_store(mock.clone());

        let rate = store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap();
        assert_eq!(rate, 1.1);
        assert!(store.contains_rate("USD", ProviderType::Fixer));
        assert_eq!(mock.live_rates_calls(), 1);

        // Second call hits the cache
        let rate = store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap();
        assert_eq!(rate, 1.1);
        assert_eq!(mock.live_rates_calls(), 1);
    }

    #[tokio::test]
    async fn test_miss_stores_whole_mapping() {
        let mock = fixer_mock();
        let store = setup_store(mock.clone());

        store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap();
        assert!(store.contains_rate("EUR", ProviderType::Fixer));

        let rate = store.get_exchange_rate("EUR", ProviderType::Fixer).await.unwrap();
        assert_eq!(rate, 0.9);
        assert_eq!(mock.live_rates_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_exchange_rate_missing_code() {
        let mock = fixer_mock();
        let store = setup_store(mock.clone());

        let err = store.get_exchange_rate("JPY", ProviderType::Fixer).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.contains_rate("JPY", ProviderType::Fixer));
        // The fetch itself succeeded, so the other rates are cached
        assert!(store.contains_rate("USD", ProviderType::Fixer));
    }

    #[tokio::test]
    async fn test_get_exchange_rate_upstream_failure() {
        let mock = fixer_mock();
        mock.fail_with(ConverterError::Unimplemented("fixer".into()));
        let store = setup_store(mock.clone());

        let err = store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap_err();
        assert!(matches!(
            err,
            ConverterError::Upstream { provider: ProviderType::Fixer, .. }
        ));
        assert!(store.is_empty());

        // No negative caching: the next lookup tries again
        mock.clear_failure();
        assert_eq!(store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap(), 1.1);
        assert_eq!(mock.live_rates_calls(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_upstream_error() {
        let store = setup_store(fixer_mock());

        let err = store.get_exchange_rate("USD", ProviderType::Yahoo).await.unwrap_err();
        assert!(matches!(err, ConverterError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_warm_cache_ignores_upstream_outage() {
        let mock = fixer_mock();
        let store = setup_store(mock.clone());
        store
            .set_exchange_rate("USD", ProviderType::Fixer, 1.3, Duration::minutes(5))
            .unwrap();

        mock.fail_with(ConverterError::Unimplemented("fixer".into()));
        assert_eq!(store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap(), 1.3);
        assert_eq!(mock.live_rates_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let mock = fixer_mock();
        let store = setup_store(mock.clone());
        store
            .set_exchange_rate("USD", ProviderType::Fixer, 7.0, Duration::milliseconds(20))
            .unwrap();

        tokio::time::sleep(StdDuration::from_millis(40)).await;

        // Still in the map until swept, but not served
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap(), 1.1);
        assert_eq!(mock.live_rates_calls(), 1);
    }

    #[tokio::test]
    async fn test_set_exchange_rate_overwrites() {
        let store = setup_store(fixer_mock());

        store
            .set_exchange_rate("GBP", ProviderType::Fixer, 1.2, Duration::minutes(1))
            .unwrap();
        store
            .set_exchange_rate("GBP", ProviderType::Fixer, 1.25, Duration::zero())
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_exchange_rate("GBP", ProviderType::Fixer).await.unwrap(), 1.25);
    }

    #[tokio::test]
    async fn test_available_currencies_cache_aside() {
        let mock = fixer_mock();
        let store = setup_store(mock.clone());

        let codes = store.available_currencies(ProviderType::Fixer).await.unwrap();
        assert_eq!(codes, vec!["USD", "EUR"]);
        assert!(store.contains_currencies(ProviderType::Fixer));

        store.available_currencies(ProviderType::Fixer).await.unwrap();
        assert_eq!(mock.currencies_calls(), 1);
    }

    #[tokio::test]
    async fn test_available_currencies_propagates_provider_error() {
        let mock = fixer_mock();
        let failure = ConverterError::Unimplemented("currency listing".into());
        mock.fail_with(failure.clone());
        let store = setup_store(mock);

        let err = store.available_currencies(ProviderType::Fixer).await.unwrap_err();
        assert_eq!(err, failure);
    }

    #[tokio::test]
    async fn test_available_currencies_empty_listing() {
        let mock = Arc::new(MockExchangeProvider::new(ProviderType::Fixer));
        let store = setup_store(mock);

        let err = store.available_currencies(ProviderType::Fixer).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_available_currencies_rejects_empty() {
        let store = setup_store(fixer_mock());

        let err = store
            .set_available_currencies(ProviderType::Fixer, Vec::new())
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_available_currencies_validity() {
        let store = setup_store(fixer_mock());
        store
            .set_available_currencies(ProviderType::Fixer, vec!["USD".into()])
            .unwrap();

        let entry = store.cached(&currencies_key(ProviderType::Fixer)).unwrap();
        let remaining = entry.expiration().unwrap() - now();
        assert!(remaining > Duration::days(13));
        assert!(remaining <= Duration::weeks(2));
    }

    #[test]
    fn test_capacity_exhausted() {
        let config = RateStoreConfig {
            max_entries: 2,
            ..Default::default()
        };
        let store = InMemoryStore::with_config(Arc::new(ProviderRegistry::new()), config);

        store
            .set_exchange_rate("USD", ProviderType::Fixer, 1.0, Duration::minutes(1))
            .unwrap();
        store
            .set_exchange_rate("EUR", ProviderType::Fixer, 1.0, Duration::minutes(1))
            .unwrap();

        let err = store
            .set_exchange_rate("GBP", ProviderType::Fixer, 1.0, Duration::minutes(1))
            .unwrap_err();
        assert!(matches!(err, ConverterError::InternalCache(_)));

        // Overwriting an existing key still works when full
        store
            .set_exchange_rate("USD", ProviderType::Fixer, 2.0, Duration::minutes(1))
            .unwrap();
    }

    #[test]
    fn test_capacity_evicts_expired_first() {
        let config = RateStoreConfig {
            max_entries: 1,
            ..Default::default()
        };
        let store = InMemoryStore::with_config(Arc::new(ProviderRegistry::new()), config);
        store
            .set_exchange_rate("USD", ProviderType::Fixer, 1.0, Duration::milliseconds(5))
            .unwrap();

        std::thread::sleep(StdDuration::from_millis(20));

        store
            .set_exchange_rate("EUR", ProviderType::Fixer, 1.0, Duration::minutes(1))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.contains_rate("EUR", ProviderType::Fixer));
    }

    #[tokio::test]
    async fn test_get_exchange_rate_internal_cache_error() {
        let config = RateStoreConfig {
            max_entries: 1,
            ..Default::default()
        };
        let registry = ProviderRegistry::new().with_provider(fixer_mock());
        let store = InMemoryStore::with_config(Arc::new(registry), config);

        // Two rates do not fit into one slot
        let err = store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap_err();
        assert!(matches!(err, ConverterError::InternalCache(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_single_flight() {
        let mock = MockExchangeProvider::new(ProviderType::Fixer)
            .with_latency(StdDuration::from_millis(50));
        mock.set_rate("USD", 1.1);
        let mock = Arc::new(mock);
        let store = setup_store(mock.clone());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.get_exchange_rate("USD", ProviderType::Fixer).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1.1);
        }
        assert_eq!(mock.live_rates_calls(), 1);
        assert_eq!(store.rate_flights.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_currency_misses_single_flight() {
        let mock = MockExchangeProvider::new(ProviderType::Fixer)
            .with_latency(StdDuration::from_millis(50));
        mock.set_currencies(&["USD"]);
        let mock = Arc::new(mock);
        let store = setup_store(mock.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.available_currencies(ProviderType::Fixer).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec!["USD"]);
        }
        assert_eq!(mock.currencies_calls(), 1);
    }

    async fn concurrent_lookups(store: &InMemoryStore, code: &str, n: usize) -> Vec<Result<f32>> {
        let mut handles = Vec::new();
        for _ in 0..n {
            let store = store.clone();
            let code = code.to_string();
            handles.push(tokio::spawn(async move {
                store.get_exchange_rate(&code, ProviderType::Fixer).await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_upstream_failure() {
        let mock = MockExchangeProvider::new(ProviderType::Fixer)
            .with_latency(StdDuration::from_millis(100));
        mock.fail_with(ConverterError::Unimplemented("fixer".into()));
        let mock = Arc::new(mock);
        let store = setup_store(mock.clone());

        let started = std::time::Instant::now();
        let results = concurrent_lookups(&store, "USD", 16).await;

        for result in results {
            assert!(matches!(result, Err(ConverterError::Upstream { .. })));
        }
        assert_eq!(mock.live_rates_calls(), 1);
        assert!(started.elapsed() < StdDuration::from_millis(500));
        assert_eq!(store.rate_flights.len(), 0);

        // The failure is not remembered
        mock.clear_failure();
        mock.set_rate("USD", 1.1);
        assert_eq!(store.get_exchange_rate("USD", ProviderType::Fixer).await.unwrap(), 1.1);
        assert_eq!(mock.live_rates_calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_not_found() {
        let mock = MockExchangeProvider::new(ProviderType::Fixer)
            .with_latency(StdDuration::from_millis(100));
        mock.set_rate("USD", 1.1);
        let mock = Arc::new(mock);
        let store = setup_store(mock.clone());

        let started = std::time::Instant::now();
        let results = concurrent_lookups(&store, "JPY", 16).await;

        for result in results {
            assert!(result.unwrap_err().is_not_found());
        }
        assert_eq!(mock.live_rates_calls(), 1);
        assert!(started.elapsed() < StdDuration::from_millis(500));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_currency_misses_share_failure() {
        let mock = MockExchangeProvider::new(ProviderType::Fixer)
            .with_latency(StdDuration::from_millis(100));
        let failure = ConverterError::Unimplemented("currency listing".into());
        mock.fail_with(failure.clone());
        let mock = Arc::new(mock);
        let store = setup_store(mock.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.available_currencies(ProviderType::Fixer).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap_err(), failure);
        }
        assert_eq!(mock.currencies_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cache_hit_not_blocked_by_slow_miss() {
        let mock = MockExchangeProvider::new(ProviderType::Fixer)
            .with_latency(StdDuration::from_millis(500));
        mock.set_rate("USD", 1.1);
        let store = setup_store(Arc::new(mock));
        store
            .set_exchange_rate("EUR", ProviderType::Fixer, 0.9, Duration::minutes(5))
            .unwrap();

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.get_exchange_rate("USD", ProviderType::Fixer).await })
        };
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let hit = tokio::time::timeout(
            StdDuration::from_millis(100),
            store.get_exchange_rate("EUR", ProviderType::Fixer),
        )
        .await;
        assert_eq!(tokio_test::assert_ok!(hit).unwrap(), 0.9);
        assert!(!slow.is_finished());

        assert_eq!(slow.await.unwrap().unwrap(), 1.1);
    }

    #[test]
    fn test_stats() {
        let store = setup_store(fixer_mock());
        store
            .set_exchange_rate("USD", ProviderType::Fixer, 1.0, Duration::minutes(1))
            .unwrap();
        store
            .set_exchange_rate("EUR", ProviderType::Fixer, 1.0, Duration::milliseconds(1))
            .unwrap();

        std::thread::sleep(StdDuration::from_millis(10));

        assert_eq!(
            store.stats(),
            CacheStats {
                total_entries: 2,
                valid_entries: 1,
                expired_entries: 1,
            }
        );
    }
}
