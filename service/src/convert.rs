//! Conversion arithmetic and request/response types.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decimal places of a converted amount.
pub const CONVERTED_DECIMAL_PLACES: u32 = 2;

/// Multiply `amount` by `rate`, rounded to two decimal places.
///
/// Returns `None` for a non-finite rate.
pub fn convert(rate: f32, amount: Decimal) -> Option<Decimal> {
    let rate = Decimal::from_f32(rate)?;
    Some((amount * rate).round_dp(CONVERTED_DECIMAL_PLACES))
}

/// An amount in a currency, with the value kept as text on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// ISO 4217 currency code.
    pub code: String,
    /// Decimal value, e.g. `"100.50"`.
    pub value: String,
}

impl Amount {
    pub fn new(code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Request to convert an amount into another currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Amount to convert.
    pub from: Amount,
    /// Target currency code.
    pub to: String,
    /// Provider name; the service default is used when absent or blank.
    #[serde(default)]
    pub exchange_provider: Option<String>,
}

impl ConversionRequest {
    pub fn new(from: Amount, to: impl Into<String>) -> Self {
        Self {
            from,
            to: to.into(),
            exchange_provider: None,
        }
    }

    /// Use a specific provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.exchange_provider = Some(provider.into());
        self
    }
}

/// Result of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResponse {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Converted amount in the target currency.
    pub converted: Amount,
    /// The amount as requested.
    pub from: Amount,
    /// Rate applied.
    pub exchange_rate: f32,
    /// When the conversion was executed.
    pub conversion_datetime: DateTime<Utc>,
    /// When the rate was obtained.
    pub exchange_rate_datetime: DateTime<Utc>,
}
