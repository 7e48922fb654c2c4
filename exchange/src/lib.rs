//! Currency Converter Exchange Providers
//!
//! The capability every upstream exchange source implements, and the
//! registry that maps a [`ProviderType`](converter_common::ProviderType) to a
//! constructed provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use converter_common::ProviderType;
//! use converter_exchange::ProviderRegistry;
//!
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.get(ProviderType::Fixer)?;
//! let rates = provider.live_rates().await?;
//! ```

pub mod provider;
pub mod registry;
pub mod providers;

pub use provider::{ExchangeProvider, Rates, SharedProvider};
pub use registry::ProviderRegistry;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockExchangeProvider;
