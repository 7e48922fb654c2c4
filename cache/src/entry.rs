//! Cached values and their expiration.

use chrono::Duration;
use converter_common::{expires_in, now, Timestamp};

/// Payload stored under a cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// Currency codes supported by a provider.
    Currencies(Vec<String>),
    /// A single exchange rate.
    Rate(f32),
}

/// Cached value plus the instant it stops being valid.
///
/// Entries are never mutated; an update replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    data: CachedValue,
    expiration: Option<Timestamp>,
}

impl CacheEntry {
    /// Create an entry valid for `validity` from now.
    ///
    /// A zero or negative validity means the entry never expires.
    pub fn new(data: CachedValue, validity: Duration) -> Self {
        let expiration = if validity > Duration::zero() {
            Some(expires_in(validity))
        } else {
            None
        };

        Self { data, expiration }
    }

    pub fn data(&self) -> &CachedValue {
        &self.data
    }

    /// `None` for entries that never expire.
    pub fn expiration(&self) -> Option<Timestamp> {
        self.expiration
    }

    /// Check if the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now())
    }

    /// Check expiry against a given instant. Exactly at expiration counts as expired.
    pub fn is_expired_at(&self, instant: Timestamp) -> bool {
        match self.expiration {
            Some(expiration) => instant >= expiration,
            None => false,
        }
    }

    /// The rate, if this entry holds one.
    pub fn rate(&self) -> Option<f32> {
        match self.data {
            CachedValue::Rate(rate) => Some(rate),
            CachedValue::Currencies(_) => None,
        }
    }

    /// The currency list, if this entry holds one.
    pub fn currencies(&self) -> Option<&[String]> {
        match &self.data {
            CachedValue::Currencies(codes) => Some(codes),
            CachedValue::Rate(_) => None,
        }
    }
}
