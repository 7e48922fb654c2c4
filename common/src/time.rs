//! Time utilities and timing defaults.

use chrono::{DateTime, Duration, Utc};

/// Timing defaults shared by the cache and the background jobs.
pub mod constants {
    use super::Duration;

    /// Default validity of a cached exchange rate (2 minutes).
    pub fn default_rate_validity() -> Duration {
        Duration::minutes(2)
    }

    /// Validity of a cached currency list (2 weeks).
    pub fn currencies_validity() -> Duration {
        Duration::weeks(2)
    }

    /// Interval between expiry sweeps (5 minutes).
    pub fn cleanup_interval() -> Duration {
        Duration::minutes(5)
    }

    /// Interval between proactive rate refreshes (5 minutes).
    pub fn refresh_interval() -> Duration {
        Duration::minutes(5)
    }
}

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Calculate expiry time from now.
pub fn expires_in(duration: Duration) -> Timestamp {
    now() + duration
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
