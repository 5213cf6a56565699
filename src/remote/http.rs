//! HTTP Store Client
//!
//! [`RemoteStore`] speaking the store server's JSON API over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::models::{
    DeleteResponse, ExistsResponse, GetResponse, KeysQuery, KeysResponse, SetRequest,
};
use crate::remote::store::RemoteStore;

/// Client for a store server reachable at `base_url`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    /// Creates a client for `base_url` applying `timeout` to every request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| StoreError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Creates a client from `config.remote_url` and `config.request_timeout_ms`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.remote_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    /// Server address without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn key_url(&self, route: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, route, urlencoding::encode(key))
    }
}

/// Rejects any non-success status.
fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self.client.get(self.key_url("get", key)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(key, "remote store miss");
            return Ok(None);
        }

        let body: GetResponse = ensure_success(response)?.json().await?;
        Ok(Some(body.value))
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        let request = SetRequest::new(key, value, (ttl_secs > 0).then_some(ttl_secs));
        let response = self
            .client
            .put(format!("{}/set", self.base_url))
            .json(&request)
            .send()
            .await?;

        ensure_success(response)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let response = self.client.delete(self.key_url("del", key)).send().await?;
        let body: DeleteResponse = ensure_success(response)?.json().await?;
        Ok(body.deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let response = self.client.get(self.key_url("has", key)).send().await?;
        let body: ExistsResponse = ensure_success(response)?.json().await?;
        Ok(body.exists)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let query = KeysQuery {
            prefix: Some(prefix.to_string()),
        };
        let response = self
            .client
            .get(format!("{}/keys", self.base_url))
            .query(&query)
            .send()
            .await?;

        let body: KeysResponse = ensure_success(response)?.json().await?;
        Ok(body.keys)
    }
}
