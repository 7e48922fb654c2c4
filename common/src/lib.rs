//! Currency Converter Common Types
//!
//! Shared types used across the converter crates: exchange provider
//! identifiers, the error taxonomy, timing defaults and the shutdown signal
//! used by background jobs.

pub mod provider;
pub mod error;
pub mod time;
pub mod shutdown;

pub use provider::*;
pub use error::*;
pub use time::*;
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
