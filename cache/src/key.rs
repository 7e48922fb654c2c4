//! Cache key derivation.

use converter_common::ProviderType;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Canonical form hashed into a rate key. Field order is fixed.
#[derive(Serialize)]
struct KeyMaterial<'a> {
    code: &'a str,
    provider: &'a str,
}

/// Key for the rate of `currency_code` as reported by `provider`.
///
/// SHA-256 over the JSON encoding of the pair, as 64 lowercase hex chars.
pub fn cache_key(currency_code: &str, provider: ProviderType) -> String {
    let material = KeyMaterial {
        code: currency_code,
        provider: provider.as_str(),
    };
    // Serializing a struct of two strings cannot fail.
    let bytes = serde_json::to_vec(&material).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Key for a provider's currency list.
pub fn currencies_key(provider: ProviderType) -> String {
    provider.as_str().to_string()
}
