use crate::cache::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Honors the TTL each entry was stored with
struct PerEntryExpiry;

impl Expiry<String, (String, Duration)> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(String, Duration),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// In-process cache store built on Moka. Stands in for Redis in tests
/// and single-node deployments; the term rankings normally maintained
/// outside the system are seeded through [`MemoryCache::seed_terms`].
pub struct MemoryCache {
    entries: Cache<String, (String, Duration)>,
    rankings: RwLock<HashMap<String, Vec<(String, f64)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        let entries = Cache::builder()
            .max_capacity(10_000)
            .expire_after(PerEntryExpiry)
            .build();

        Self {
            entries,
            rankings: RwLock::new(HashMap::new()),
        }
    }

    /// Install a score-ordered term collection under a ranking key,
    /// replacing whatever was there
    pub fn seed_terms(&self, key: &str, terms: Vec<(String, f64)>) {
        let mut sorted = terms;
        sorted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        self.rankings.write().insert(key.to_string(), sorted);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .get(key)
            .await
            .map(|(value, _ttl)| value))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), (value.to_string(), ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let existed = self.entries.get(key).await.is_some();
        self.entries.invalidate(key).await;
        Ok(existed)
    }

    async fn top_terms(&self, key: &str, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .rankings
            .read()
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .take(limit)
                    .map(|(term, _score)| term.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
