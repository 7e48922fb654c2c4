//! Service configuration.

use std::time::Duration;

use converter_cache::RateStoreConfig;
use converter_common::{constants, DurationExt, ProviderType};

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interval between expiry sweeps.
    pub cleanup_interval: Duration,
    /// Interval between proactive rate refreshes.
    pub refresh_interval: Duration,
    /// Validity of cached rates.
    pub rate_validity: Duration,
    /// Validity of cached currency lists.
    pub currencies_validity: Duration,
    /// Maximum cache entries.
    pub max_entries: usize,
    /// Provider used when a request names none.
    pub default_provider: ProviderType,
    /// Providers raced by the periodic refresh.
    pub providers: Vec<ProviderType>,
    /// Log level.
    pub log_level: String,
    /// Emit JSON logs.
    pub json_logs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: constants::cleanup_interval().as_std(),
            refresh_interval: constants::refresh_interval().as_std(),
            rate_validity: constants::default_rate_validity().as_std(),
            currencies_validity: constants::currencies_validity().as_std(),
            max_entries: RateStoreConfig::default().max_entries,
            default_provider: ProviderType::default(),
            providers: ProviderType::supported(),
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable numbers keep their defaults. An unknown provider
    /// name is an error.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("CONVERTER_CLEANUP_INTERVAL_SECS") {
            config.cleanup_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("CONVERTER_REFRESH_INTERVAL_SECS") {
            config.refresh_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("CONVERTER_RATE_VALIDITY_SECS") {
            config.rate_validity = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("CONVERTER_CURRENCIES_VALIDITY_SECS") {
            config.currencies_validity = Duration::from_secs(secs);
        }

        if let Some(max) = env_parse::<usize>("CONVERTER_MAX_ENTRIES") {
            config.max_entries = max;
        }

        if let Ok(name) = std::env::var("CONVERTER_DEFAULT_PROVIDER") {
            config.default_provider = name.parse().map_err(|e| format!("{}", e))?;
        }

        if let Ok(list) = std::env::var("CONVERTER_PROVIDERS") {
            config.providers = ProviderType::parse_list(&list).map_err(|e| format!("{}", e))?;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(format) = std::env::var("CONVERTER_LOG_FORMAT") {
            config.json_logs = !format.eq_ignore_ascii_case("pretty");
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cleanup_interval.is_zero() {
            return Err("Cleanup interval cannot be zero".to_string());
        }

        if self.refresh_interval.is_zero() {
            return Err("Refresh interval cannot be zero".to_string());
        }

        if self.rate_validity.is_zero() || self.currencies_validity.is_zero() {
            return Err("Cache validity cannot be zero".to_string());
        }

        if self.max_entries == 0 {
            return Err("Max cache entries cannot be 0".to_string());
        }

        if self.providers.is_empty() {
            return Err("At least one exchange provider must be configured".to_string());
        }

        Ok(())
    }

    /// Store configuration derived from this service configuration.
    pub fn store_config(&self) -> RateStoreConfig {
        RateStoreConfig {
            rate_validity: to_chrono(self.rate_validity),
            currencies_validity: to_chrono(self.currencies_validity),
            max_entries: self.max_entries,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
