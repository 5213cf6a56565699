//! Remote Store Trait
//!
//! The narrow key/value protocol a network-backed cache forwards to.

use async_trait::async_trait;

use crate::cache::NO_EXPIRY_MS;
use crate::error::Result;

// == Remote Store ==
/// A string key/value store reached over some transport.
///
/// Keys are physical keys, already namespaced by the caller. Values are the
/// caller's serialized text.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`. `ttl_secs == 0` means the value never expires.
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()>;

    /// Removes `key`, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether a live value is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Lists live keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Converts a store TTL in seconds into a cache TTL in milliseconds.
///
/// Zero maps to [`NO_EXPIRY_MS`].
pub fn ttl_secs_to_ms(ttl_secs: u64) -> i64 {
    if ttl_secs == 0 {
        return NO_EXPIRY_MS;
    }
    i64::try_from(ttl_secs.saturating_mul(1000)).unwrap_or(NO_EXPIRY_MS)
}
