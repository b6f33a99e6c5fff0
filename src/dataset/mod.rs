//! Direct key-value dataset storage over the cache capability. Unlike
//! the search paths, these operations surface cache trouble to the
//! caller, and an absent or expired key is an explicit `NotFound`.

use crate::cache::CacheStore;
use crate::config::CacheConfig;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A stored dataset entry, echoed back on save with defaults filled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub prefix: String,
    pub key: String,
    pub value: String,
    pub ttl_secs: u64,
}

impl Dataset {
    /// Full cache key: `{prefix}:{key}`
    pub fn full_key(&self) -> String {
        format!("{}:{}", self.prefix, self.key)
    }
}

/// Save request; absent fields take configured defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveDataset {
    pub key: Option<String>,
    pub value: String,
    pub ttl_secs: Option<u64>,
    pub prefix: Option<String>,
}

/// Arbitrary dataset store service
pub struct DatasetService {
    cache: Arc<dyn CacheStore>,
    default_ttl_secs: u64,
    default_prefix: String,
}

impl DatasetService {
    pub fn new(cache: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            cache,
            default_ttl_secs: config.default_ttl_secs,
            default_prefix: config.default_prefix.clone(),
        }
    }

    /// Store a dataset, generating a short random key when none is given
    pub async fn save(&self, request: SaveDataset) -> Result<Dataset> {
        let dataset = Dataset {
            prefix: request
                .prefix
                .unwrap_or_else(|| self.default_prefix.clone()),
            key: request.key.unwrap_or_else(random_key),
            value: request.value,
            ttl_secs: request.ttl_secs.unwrap_or(self.default_ttl_secs),
        };

        self.cache
            .set_with_ttl(
                &dataset.full_key(),
                &dataset.value,
                Duration::from_secs(dataset.ttl_secs),
            )
            .await?;

        tracing::debug!(key = %dataset.full_key(), ttl_secs = dataset.ttl_secs, "dataset saved");
        Ok(dataset)
    }

    /// Fetch a dataset value; `NotFound` when absent or expired
    pub async fn get(&self, prefix: Option<&str>, key: &str) -> Result<String> {
        let full_key = self.full_key(prefix, key);
        match self.cache.get(&full_key).await? {
            Some(value) => Ok(value),
            None => Err(AppError::NotFound(format!(
                "dataset key {} not found or expired",
                full_key
            ))),
        }
    }

    /// Delete a dataset, verifying it exists first
    pub async fn delete(&self, prefix: Option<&str>, key: &str) -> Result<bool> {
        self.get(prefix, key).await?;
        self.cache.delete(&self.full_key(prefix, key)).await
    }

    fn full_key(&self, prefix: Option<&str>, key: &str) -> String {
        format!("{}:{}", prefix.unwrap_or(&self.default_prefix), key)
    }
}

/// Five random alphanumeric characters, enough for ad-hoc dataset keys
fn random_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..5].to_string()
}
