//! Currency Converter Service
//!
//! Conversion requests on top of the rate cache, the background jobs that
//! keep the cache warm and tidy, and the service configuration.

pub mod config;
pub mod convert;
pub mod service;
pub mod jobs;

pub use config::ServiceConfig;
pub use convert::{convert, Amount, ConversionRequest, ConversionResponse};
pub use service::ConverterService;
