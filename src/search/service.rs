//! Paginated, cache-aside product search with relevance ranking and a
//! substring fallback for queries the weighted index cannot match.

use crate::cache::CacheStore;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::models::SearchResponse;
use crate::search::pattern::flexible_pattern;
use crate::store::{ProductQuery, ProductStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Page size bounds; requests outside are clamped, never rejected
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_LIMIT: u32 = 20;

/// Queries longer than this skip the exact-sku boost lookup
const MAX_BOOST_QUERY_LEN: usize = 64;

/// Main search service
pub struct SearchService {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn CacheStore>,
    result_ttl: Duration,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn ProductStore>,
        cache: Arc<dyn CacheStore>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            store,
            cache,
            result_ttl: Duration::from_secs(config.result_ttl_secs),
        }
    }

    /// Search the catalog. `page` and `limit` default to 1 and 20 and
    /// are clamped; a blank query returns an empty response without
    /// touching cache or store.
    pub async fn search(
        &self,
        query: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT);
        let page = page.unwrap_or(1).max(1);

        if query.is_empty() {
            return Ok(SearchResponse::empty(page, limit));
        }

        let cache_key = format!("search:q={}:page={}:limit={}", query, page, limit);

        // Cache probe: any failure or corruption is just a miss
        let probe_started = Instant::now();
        match self.cache.get(&cache_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<SearchResponse>(&raw) {
                Ok(mut cached) => {
                    cached.cached = true;
                    cached.took_ms = probe_started.elapsed().as_millis() as u64;
                    tracing::debug!(key = %cache_key, "search cache hit");
                    return Ok(cached);
                }
                Err(e) => {
                    tracing::warn!(key = %cache_key, error = %e, "corrupted search cache entry, querying store");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %cache_key, error = %e, "search cache read failed, querying store");
            }
        }

        let started = Instant::now();
        let skip = ((page as u64 - 1) * limit as u64) as usize;

        // Primary path: weighted relevance. Fallback only when the
        // ranked query matched nothing at all.
        let text_query = ProductQuery::Text(query.to_string());
        let mut total_items = self.store.count_documents(&text_query).await?;
        let mut items = if total_items > 0 {
            self.store.query(&text_query, skip, limit as usize).await?
        } else {
            let fallback = ProductQuery::AnyFieldRegex(flexible_pattern(query));
            total_items = self.store.count_documents(&fallback).await?;
            self.store.query(&fallback, skip, limit as usize).await?
        };

        // Exact-sku boost on the store-served path
        if query.len() <= MAX_BOOST_QUERY_LEN {
            if let Some(exact) = self.store.find_one_by_sku(query).await? {
                let identity = exact.identity();
                let already_present =
                    identity.is_some() && items.iter().any(|item| item.identity() == identity);
                if !already_present {
                    items.insert(0, exact);
                }
            }
        }

        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + limit as u64 - 1) / limit as u64
        };

        let response = SearchResponse {
            items,
            page,
            limit,
            total_items,
            total_pages,
            took_ms: started.elapsed().as_millis() as u64,
            cached: false,
        };

        match serde_json::to_string(&response) {
            Ok(serialized) => {
                if let Err(e) = self
                    .cache
                    .set_with_ttl(&cache_key, &serialized, self.result_ttl)
                    .await
                {
                    tracing::warn!(key = %cache_key, error = %e, "search cache write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize search response for cache"),
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::AppError;
    use crate::models::{Product, UpsertOp};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper counting ranked queries and sku lookups
    struct ProbeStore {
        inner: MemoryStore,
        text_counts: AtomicUsize,
        sku_lookups: AtomicUsize,
    }

    impl ProbeStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                text_counts: AtomicUsize::new(0),
                sku_lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProductStore for ProbeStore {
        async fn query(
            &self,
            query: &ProductQuery,
            skip: usize,
            limit: usize,
        ) -> Result<Vec<Product>> {
            self.inner.query(query, skip, limit).await
        }

        async fn count_documents(&self, query: &ProductQuery) -> Result<u64> {
            if matches!(query, ProductQuery::Text(_)) {
                self.text_counts.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.count_documents(query).await
        }

        async fn find_one_by_sku(&self, sku: &str) -> Result<Option<Product>> {
            self.sku_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_one_by_sku(sku).await
        }

        async fn bulk_upsert(&self, ops: Vec<UpsertOp>) -> Result<()> {
            self.inner.bulk_upsert(ops).await
        }
    }

    /// Cache stub that fails every operation
    struct BrokenCache;

    #[async_trait]
    impl CacheStore for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::Internal("cache down".to_string()))
        }

        async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            Err(AppError::Internal("cache down".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<bool> {
            Err(AppError::Internal("cache down".to_string()))
        }

        async fn top_terms(&self, _key: &str, _limit: usize) -> Result<Vec<String>> {
            Err(AppError::Internal("cache down".to_string()))
        }
    }

    fn doc(title: &str, category: &str, sku: &str) -> Product {
        Product {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            sku: Some(sku.to_string()),
            ..Default::default()
        }
    }

    async fn seed(store: &dyn ProductStore, docs: Vec<Product>) {
        let ops = docs
            .into_iter()
            .map(|patch| UpsertOp {
                filter: patch.identity().unwrap(),
                patch,
            })
            .collect();
        store.bulk_upsert(ops).await.unwrap();
    }

    fn service(store: Arc<dyn ProductStore>, cache: Arc<dyn CacheStore>) -> SearchService {
        SearchService::new(store, cache, &SearchConfig::default())
    }

    #[tokio::test]
    async fn test_blank_query_short_circuits() {
        let store = Arc::new(ProbeStore::new());
        let cache = Arc::new(MemoryCache::new());
        let service = service(store.clone(), cache);

        let response = service.search("   ", None, None).await.unwrap();
        assert_eq!(response, SearchResponse::empty(1, 20));
        assert_eq!(store.text_counts.load(Ordering::SeqCst), 0);
        assert_eq!(store.sku_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clamping() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let service = service(store, cache);

        let response = service.search("", Some(0), Some(0)).await.unwrap();
        assert_eq!(response.page, 1);
        assert_eq!(response.limit, 1);

        let response = service.search("", Some(3), Some(500)).await.unwrap();
        assert_eq!(response.page, 3);
        assert_eq!(response.limit, 50);
    }

    #[tokio::test]
    async fn test_second_identical_query_is_served_from_cache() {
        let store = Arc::new(ProbeStore::new());
        let cache = Arc::new(MemoryCache::new());
        seed(
            store.as_ref(),
            vec![doc("Red shoes", "Footwear", "R-1"), doc("Blue shoes", "Footwear", "B-1")],
        )
        .await;
        let service = service(store.clone(), cache);

        let first = service.search("red shoes", Some(1), Some(20)).await.unwrap();
        assert!(!first.cached);
        let ranked_queries = store.text_counts.load(Ordering::SeqCst);

        let second = service.search("red shoes", Some(1), Some(20)).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.items, first.items);
        // No further ranking query was issued
        assert_eq!(store.text_counts.load(Ordering::SeqCst), ranked_queries);
    }

    #[tokio::test]
    async fn test_different_pagination_is_a_different_cache_entry() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        seed(store.as_ref(), vec![doc("Red shoes", "Footwear", "R-1")]).await;
        let service = service(store, cache);

        let first = service.search("shoes", Some(1), Some(20)).await.unwrap();
        let other_page = service.search("shoes", Some(2), Some(20)).await.unwrap();
        assert!(!first.cached);
        assert!(!other_page.cached);
    }

    #[tokio::test]
    async fn test_fallback_matches_substrings_sorted_by_title() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        seed(
            store.as_ref(),
            vec![
                doc("Zen lamp", "lighting", "Z-1"),
                doc("Amber lamp", "lighting", "A-1"),
                doc("Desk chair", "furniture", "D-1"),
            ],
        )
        .await;
        let service = service(store, cache);

        // "ligh" is no complete token, so the weighted index misses it
        let response = service.search("ligh", None, None).await.unwrap();
        let titles: Vec<_> = response
            .items
            .iter()
            .filter_map(|p| p.title.as_deref())
            .collect();
        assert_eq!(titles, vec!["Amber lamp", "Zen lamp"]);
        assert_eq!(response.total_items, 2);
        assert_eq!(response.total_pages, 1);
    }

    #[tokio::test]
    async fn test_fallback_pagination_arithmetic() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let docs: Vec<Product> = (0..5)
            .map(|i| doc(&format!("Item {}", i), "widgetry", &format!("W-{}", i)))
            .collect();
        seed(store.as_ref(), docs).await;
        let service = service(store, cache);

        let response = service.search("widget", Some(2), Some(2)).await.unwrap();
        assert_eq!(response.total_items, 5);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.items.len(), 2);
    }

    #[tokio::test]
    async fn test_exact_sku_boost_prepends_missing_match() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        // Title matches rank well above the sku-only match, pushing it
        // off the first page
        let mut docs: Vec<Product> = (0..3)
            .map(|i| doc(&format!("Lamp {}", i), "lighting", &format!("L-{}", i)))
            .collect();
        docs.push(doc("Spare part", "parts", "lamp"));
        seed(store.as_ref(), docs).await;
        let service = service(store, cache);

        let response = service.search("lamp", Some(1), Some(2)).await.unwrap();
        assert_eq!(response.items[0].sku.as_deref(), Some("lamp"));
        // Prepended on top of the requested page
        assert_eq!(response.items.len(), 3);
    }

    #[tokio::test]
    async fn test_exact_sku_boost_skips_duplicates_and_long_queries() {
        let store = Arc::new(ProbeStore::new());
        let cache = Arc::new(MemoryCache::new());
        seed(store.as_ref(), vec![doc("Lamp", "lighting", "lamp")]).await;
        let service = service(store.clone(), cache);

        let response = service.search("lamp", None, None).await.unwrap();
        assert_eq!(response.items.len(), 1);

        let long_query = "x".repeat(65);
        let lookups_before = store.sku_lookups.load(Ordering::SeqCst);
        service.search(&long_query, None, None).await.unwrap();
        assert_eq!(store.sku_lookups.load(Ordering::SeqCst), lookups_before);
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_store() {
        let store = Arc::new(MemoryStore::new());
        seed(store.as_ref(), vec![doc("Red shoes", "Footwear", "R-1")]).await;
        let service = service(store, Arc::new(BrokenCache));

        let first = service.search("shoes", None, None).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.total_items, 1);

        // Still not cached, still served
        let second = service.search("shoes", None, None).await.unwrap();
        assert!(!second.cached);
    }

    #[tokio::test]
    async fn test_corrupted_cache_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        seed(store.as_ref(), vec![doc("Red shoes", "Footwear", "R-1")]).await;

        cache
            .set_with_ttl(
                "search:q=shoes:page=1:limit=20",
                "{not json",
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let service = service(store, cache.clone());
        let response = service.search("shoes", None, None).await.unwrap();
        assert!(!response.cached);
        assert_eq!(response.total_items, 1);

        // The bad entry was overwritten by the fresh response
        let raw = cache
            .get("search:q=shoes:page=1:limit=20")
            .await
            .unwrap()
            .unwrap();
        assert!(serde_json::from_str::<SearchResponse>(&raw).is_ok());
    }

    #[tokio::test]
    async fn test_query_is_trimmed_but_not_lowercased_in_key() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        seed(store.as_ref(), vec![doc("Red shoes", "Footwear", "R-1")]).await;
        let service = service(store, cache.clone());

        service.search("  Shoes  ", None, None).await.unwrap();
        assert!(cache
            .get("search:q=Shoes:page=1:limit=20")
            .await
            .unwrap()
            .is_some());
    }
}
