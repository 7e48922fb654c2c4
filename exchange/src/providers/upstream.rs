//! Adapters for the public exchange rate APIs.

use async_trait::async_trait;
use converter_common::{ConverterError, ProviderType, Result};
use tracing::warn;

use crate::provider::{ExchangeProvider, Rates};

/// Adapter for one of the supported public APIs.
///
/// No HTTP client is wired in yet, so both operations report the provider as
/// unimplemented. The refresh fan-out tolerates that, and lookups surface it
/// to the caller.
#[derive(Debug, Clone)]
pub struct UpstreamProvider {
    provider_type: ProviderType,
    api: &'static str,
}

impl UpstreamProvider {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api: api_base(provider_type),
        }
    }

    /// Base URL of the provider's public API.
    pub fn api(&self) -> &'static str {
        self.api
    }

    fn unimplemented(&self, operation: &str) -> ConverterError {
        warn!(provider = %self.provider_type, api = self.api, operation, "Provider client not implemented");
        ConverterError::Unimplemented(format!(
            "{} not implemented for provider {}",
            operation, self.provider_type
        ))
    }
}

fn api_base(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::CurrencyLayer => "https://api.currencylayer.com",
        ProviderType::CoinGecko => "https://api.coingecko.com/api/v3",
        ProviderType::Google => "https://www.google.com/finance",
        ProviderType::Fixer => "https://data.fixer.io/api",
        ProviderType::OpenExchangeRates => "https://openexchangerates.org/api",
        ProviderType::Yahoo => "https://query1.finance.yahoo.com",
    }
}

#[async_trait]
impl ExchangeProvider for UpstreamProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    async fn live_rates(&self) -> Result<Rates> {
        Err(self.unimplemented("live rates"))
    }

    async fn currencies(&self) -> Result<Vec<String>> {
        Err(self.unimplemented("currency listing"))
    }
}
