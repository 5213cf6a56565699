//! In-Process Store
//!
//! [`RemoteStore`] backed by an [`ExpiringCache`], for tests and for running
//! network-backed caches without a network.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::ExpiringCache;
use crate::error::Result;
use crate::remote::store::{ttl_secs_to_ms, RemoteStore};

/// A store living in this process. Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    cache: Arc<ExpiringCache<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store sweeping expired keys every `sweep_interval_ms`.
    pub fn new(sweep_interval_ms: i64) -> Self {
        Self::from_cache(Arc::new(ExpiringCache::new(sweep_interval_ms)))
    }

    /// Wraps an existing cache, e.g. the one behind the store server.
    pub fn from_cache(cache: Arc<ExpiringCache<String, String>>) -> Self {
        Self { cache }
    }

    /// The cache holding this store's data.
    pub fn cache(&self) -> &Arc<ExpiringCache<String, String>> {
        &self.cache
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        self.cache
            .set_with_ttl(key.to_string(), value, ttl_secs_to_ms(ttl_secs));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.cache.delete(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.cache.get(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.cache.purge_expired();
        Ok(self
            .cache
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
