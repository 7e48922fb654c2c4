//! Mapping from provider identifiers to constructed providers.

use std::collections::HashMap;
use std::sync::Arc;

use converter_common::{ConverterError, ProviderType, Result};
use tracing::debug;

use crate::provider::{ExchangeProvider, SharedProvider};
use crate::providers::UpstreamProvider;

/// Table of available exchange providers.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderType, SharedProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in adapter for every supported provider.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for provider_type in ProviderType::supported() {
            registry.register(Arc::new(UpstreamProvider::new(provider_type)));
        }
        registry
    }

    /// Register a provider under its own type, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn ExchangeProvider>) {
        let provider_type = provider.provider_type();
        debug!(provider = %provider_type, "Registered exchange provider");
        self.providers.insert(provider_type, provider);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(mut self, provider: Arc<dyn ExchangeProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Look up the provider for an identifier.
    pub fn get(&self, provider_type: ProviderType) -> Result<SharedProvider> {
        self.providers.get(&provider_type).cloned().ok_or_else(|| {
            ConverterError::Unimplemented(format!(
                "exchange provider {} is not registered",
                provider_type
            ))
        })
    }

    /// Check whether an identifier is registered.
    pub fn contains(&self, provider_type: ProviderType) -> bool {
        self.providers.contains_key(&provider_type)
    }

    /// Registered identifiers, sorted.
    pub fn provider_types(&self) -> Vec<ProviderType> {
        let mut types: Vec<ProviderType> = self.providers.keys().copied().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
