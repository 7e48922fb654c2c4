//! Currency Converter Rate Cache
//!
//! In-memory cache shielding exchange providers from repeated calls.
//!
//! # Features
//!
//! - Per-entry expiration with an eternal sentinel
//! - Cache-aside lookups with single-flight miss handling
//! - Multi-provider refresh where the first success wins
//! - Periodic expiry sweep
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use converter_cache::{InMemoryStore, RateStore};
//! use converter_common::ProviderType;
//! use converter_exchange::ProviderRegistry;
//!
//! let store = InMemoryStore::new(Arc::new(ProviderRegistry::with_defaults()));
//!
//! let rate = store.get_exchange_rate("EUR", ProviderType::Fixer).await?;
//! store.refresh_exchange_rates(&ProviderType::supported()).await?;
//! store.cleanup_all_expired();
//! ```

pub mod entry;
mod flight;
pub mod key;
pub mod store;
pub mod memory;
pub mod refresh;
pub mod sweep;

pub use entry::{CacheEntry, CachedValue};
pub use key::{cache_key, currencies_key};
pub use store::{CacheStats, RateStore, RateStoreConfig, SharedRateStore};
pub use memory::InMemoryStore;
pub use refresh::RefreshSummary;
