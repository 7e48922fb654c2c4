//! Built-in provider adapters.

mod upstream;

pub use upstream::UpstreamProvider;
