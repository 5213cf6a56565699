//! Network-Backed Cache
//!
//! A namespaced, JSON-encoding front for a [`RemoteStore`]. Every failure is
//! logged and turned into a neutral result; callers cannot tell "absent" from
//! "request failed".

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::remote::{HttpStore, RemoteStore};

// == Remote Cache ==
/// Cache of `V` values held in a remote store under a per-instance namespace.
pub struct RemoteCache<V, S = HttpStore> {
    store: S,
    namespace: String,
    _values: PhantomData<fn() -> V>,
}

impl<V> RemoteCache<V, HttpStore>
where
    V: Serialize + DeserializeOwned,
{
    /// Creates a cache over an [`HttpStore`] built from `config`.
    ///
    /// Uses `config.namespace` when set, a random UUID otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = HttpStore::from_config(config)?;
        Ok(match &config.namespace {
            Some(namespace) => Self::with_namespace(store, namespace.clone()),
            None => Self::new(store),
        })
    }
}

impl<V, S> RemoteCache<V, S>
where
    V: Serialize + DeserializeOwned,
    S: RemoteStore,
{
    // == Constructor ==
    /// Creates a cache under a fresh random namespace.
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, Uuid::new_v4().to_string())
    }

    /// Creates a cache whose keys are stored under `namespace`.
    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            _values: PhantomData,
        }
    }

    /// Prefix of every physical key this cache writes.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn key_prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// Lists this namespace's physical keys, empty on failure.
    async fn physical_keys(&self) -> Vec<String> {
        match self.store.keys(&self.key_prefix()).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "remote cache key listing failed");
                Vec::new()
            }
        }
    }

    /// Fetches and decodes one physical key.
    async fn fetch(&self, physical_key: &str) -> Option<V> {
        let text = match self.store.get(physical_key).await {
            Ok(text) => text?,
            Err(e) => {
                warn!(key = physical_key, error = %e, "remote cache get failed");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = physical_key, error = %e, "remote cache value is not valid JSON");
                None
            }
        }
    }

    // == Get ==
    /// Returns the value for `key`, or `None` when absent or on any failure.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.fetch(&self.physical_key(key)).await
    }

    // == Set ==
    /// Stores `value` for `ttl_secs` seconds (0 = no expiry). Returns success.
    pub async fn set(&self, key: &str, value: &V, ttl_secs: u64) -> bool {
        let physical_key = self.physical_key(key);
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(key = %physical_key, error = %e, "remote cache value could not be encoded");
                return false;
            }
        };

        match self.store.set(&physical_key, text, ttl_secs).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %physical_key, error = %e, "remote cache set failed");
                false
            }
        }
    }

    // == Delete ==
    /// Removes `key`; `true` only when the store confirms it existed.
    pub async fn delete(&self, key: &str) -> bool {
        let physical_key = self.physical_key(key);
        match self.store.delete(&physical_key).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(key = %physical_key, error = %e, "remote cache delete failed");
                false
            }
        }
    }

    // == Has ==
    /// Whether a live value is stored for `key`, `false` on failure.
    pub async fn has(&self, key: &str) -> bool {
        let physical_key = self.physical_key(key);
        match self.store.exists(&physical_key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(key = %physical_key, error = %e, "remote cache existence check failed");
                false
            }
        }
    }

    // == Values ==
    /// Every decodable value in this namespace, in the store's key order.
    pub async fn values(&self) -> Vec<V> {
        let mut values = Vec::new();
        for physical_key in self.physical_keys().await {
            if let Some(value) = self.fetch(&physical_key).await {
                values.push(value);
            }
        }
        values
    }

    // == Clear ==
    /// Removes every key in this namespace. Other namespaces are untouched.
    pub async fn clear(&self) {
        for physical_key in self.physical_keys().await {
            if let Err(e) = self.store.delete(&physical_key).await {
                warn!(key = %physical_key, error = %e, "remote cache clear failed for key");
            }
        }
    }

    // == Size ==
    /// Number of live keys in this namespace, 0 on failure.
    pub async fn size(&self) -> usize {
        self.physical_keys().await.len()
    }
}
