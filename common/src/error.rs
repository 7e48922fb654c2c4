//! Error types for the currency converter.

use crate::ProviderType;
use thiserror::Error;

/// Main error type for converter operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConverterError {
    /// Caller supplied an empty or absent value where data was required.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A requested key has no cached value after an otherwise successful fetch.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The upstream provider call failed.
    #[error("Failed to get exchange rates from {provider}: {reason}")]
    Upstream {
        provider: ProviderType,
        reason: String,
    },

    /// A cache mutation failed for reasons internal to the cache.
    #[error("Cache transaction failed: {0}")]
    InternalCache(String),

    /// Operation not supported by a provider or service method.
    #[error("Not implemented: {0}")]
    Unimplemented(String),

    /// Every provider in a refresh fan-out failed.
    #[error("No exchange provider could be reached ({attempted} attempted)")]
    NoProvidersReachable { attempted: usize },

    /// Operation abandoned because of shutdown.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl ConverterError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConverterError::Upstream { .. }
                | ConverterError::NoProvidersReachable { .. }
                | ConverterError::Cancelled(_)
        )
    }

    /// Get error code for responses and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConverterError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ConverterError::NotFound(_) => "NOT_FOUND",
            ConverterError::Upstream { .. } => "UPSTREAM_ERROR",
            ConverterError::InternalCache(_) => "INTERNAL_CACHE_ERROR",
            ConverterError::Unimplemented(_) => "UNIMPLEMENTED",
            ConverterError::NoProvidersReachable { .. } => "NO_PROVIDERS_REACHABLE",
            ConverterError::Cancelled(_) => "CANCELLED",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConverterError::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ConverterError::InvalidArgument(_))
    }

    /// Internal-class errors: upstream failures and cache failures.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ConverterError::Upstream { .. } | ConverterError::InternalCache(_)
        )
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ConverterError>;
