//! Conversion request handling.

use converter_cache::SharedRateStore;
use converter_common::{now, ConverterError, ProviderType, Result};
use converter_exchange::Rates;
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::convert::{convert, Amount, ConversionRequest, ConversionResponse};

/// Answers conversion requests from the shared rate store.
pub struct ConverterService {
    store: SharedRateStore,
    default_provider: ProviderType,
}

impl ConverterService {
    pub fn new(store: SharedRateStore, default_provider: ProviderType) -> Self {
        Self {
            store,
            default_provider,
        }
    }

    /// Convert an amount at the provider's current rate for the target currency.
    #[instrument(skip(self, request), fields(from = %request.from.code, to = %request.to))]
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionResponse> {
        let provider = self.resolve_provider(request.exchange_provider.as_deref())?;

        let to = request.to.trim().to_string();
        if to.is_empty() {
            return Err(ConverterError::InvalidArgument(
                "target currency is required".to_string(),
            ));
        }

        let amount: Decimal = request.from.value.trim().parse().map_err(|_| {
            ConverterError::InvalidArgument(format!("invalid amount: {:?}", request.from.value))
        })?;

        let rate = self.store.get_exchange_rate(&to, provider).await?;
        let rate_datetime = now();

        let value = convert(rate, amount).ok_or_else(|| ConverterError::Upstream {
            provider,
            reason: format!("non-finite {} rate", to),
        })?;

        let response = ConversionResponse {
            id: Uuid::now_v7(),
            converted: Amount::new(to, format!("{:.2}", value)),
            from: request.from,
            exchange_rate: rate,
            conversion_datetime: now(),
            exchange_rate_datetime: rate_datetime,
        };

        info!(
            conversion_id = %response.id,
            provider = %provider,
            rate,
            converted = %response.converted.value,
            "Conversion completed"
        );

        Ok(response)
    }

    /// Currencies supported by a provider (the default when `None` or blank).
    pub async fn available_currencies(&self, provider: Option<&str>) -> Result<Vec<String>> {
        let provider = self.resolve_provider(provider)?;
        self.store.available_currencies(provider).await
    }

    /// Listing every cached rate is not supported yet.
    pub async fn list_exchange_rates(&self, _provider: Option<&str>) -> Result<Rates> {
        Err(ConverterError::Unimplemented(
            "list exchange rates".to_string(),
        ))
    }

    /// Batch conversion is not supported yet.
    pub async fn batch_convert(
        &self,
        _requests: Vec<ConversionRequest>,
    ) -> Result<Vec<ConversionResponse>> {
        Err(ConverterError::Unimplemented("batch convert".to_string()))
    }

    fn resolve_provider(&self, name: Option<&str>) -> Result<ProviderType> {
        match name.map(str::trim) {
            None | Some("") => Ok(self.default_provider),
            Some(name) => name.parse(),
        }
    }
}
