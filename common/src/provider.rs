//! Exchange rate provider identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConverterError;

/// Identifies an upstream exchange rate source.
///
/// The set is closed: rates and currency lists are cached per provider, and
/// the identifier doubles as the registry selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    CurrencyLayer,
    CoinGecko,
    Google,
    Fixer,
    OpenExchangeRates,
    Yahoo,
}

impl ProviderType {
    /// All supported providers in declaration order.
    pub fn supported() -> Vec<ProviderType> {
        vec![
            ProviderType::CurrencyLayer,
            ProviderType::CoinGecko,
            ProviderType::Google,
            ProviderType::Fixer,
            ProviderType::OpenExchangeRates,
            ProviderType::Yahoo,
        ]
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::CurrencyLayer => "currencylayer",
            ProviderType::CoinGecko => "coingecko",
            ProviderType::Google => "google",
            ProviderType::Fixer => "fixer",
            ProviderType::OpenExchangeRates => "openexchangerates",
            ProviderType::Yahoo => "yahoo",
        }
    }

    /// Parse a comma-separated provider list, e.g. `"fixer, yahoo"`.
    ///
    /// Blank items are skipped; any unknown name fails the whole parse.
    pub fn parse_list(s: &str) -> Result<Vec<ProviderType>, ConverterError> {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl Default for ProviderType {
    fn default() -> Self {
        ProviderType::CurrencyLayer
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ProviderType::supported()
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| {
                ConverterError::InvalidArgument(format!("unknown exchange provider: {}", s.trim()))
            })
    }
}
