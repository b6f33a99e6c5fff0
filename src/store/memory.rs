use crate::error::{AppError, Result};
use crate::models::{Product, UpsertOp};
use crate::store::{ProductQuery, ProductStore, TEXT_INDEX_WEIGHTS};
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::collections::HashSet;

/// In-memory product store enforcing the weighted text-index contract.
/// Used as the injectable substitute for the external document store.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Snapshot of all documents, for assertions in tests
    pub fn all(&self) -> Vec<Product> {
        self.docs.read().clone()
    }

    fn indexed_field<'a>(product: &'a Product, name: &str) -> Option<&'a str> {
        match name {
            "title" => product.title.as_deref(),
            "category" => product.category.as_deref(),
            "brand" => product.brand.as_deref(),
            "sku" => product.sku.as_deref(),
            "product_type" => product.product_type.as_deref(),
            _ => None,
        }
    }

    fn tokenize(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// Relevance score: for every query token found among a field's
    /// tokens, the field's index weight is added. Zero means no match.
    fn text_score(product: &Product, query_tokens: &HashSet<String>) -> f64 {
        let mut score = 0.0;
        for (field, weight) in TEXT_INDEX_WEIGHTS {
            let Some(value) = Self::indexed_field(product, field) else {
                continue;
            };
            let field_tokens = Self::tokenize(value);
            for token in query_tokens {
                if field_tokens.contains(token) {
                    score += weight;
                }
            }
        }
        score
    }

    fn regex_matches(product: &Product, re: &Regex) -> bool {
        TEXT_INDEX_WEIGHTS
            .iter()
            .filter_map(|(field, _)| Self::indexed_field(product, field))
            .any(|value| re.is_match(value))
    }

    fn compile(pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::Internal(format!("invalid store query pattern: {}", e)))
    }

    fn matching(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let docs = self.docs.read();
        match query {
            ProductQuery::Text(text) => {
                let query_tokens = Self::tokenize(text);
                if query_tokens.is_empty() {
                    return Ok(Vec::new());
                }
                let mut scored: Vec<(f64, Product)> = docs
                    .iter()
                    .filter_map(|doc| {
                        let score = Self::text_score(doc, &query_tokens);
                        (score > 0.0).then(|| (score, doc.clone()))
                    })
                    .collect();
                // Score descending, title ascending as the deterministic tie-break
                scored.sort_by(|a, b| {
                    b.0.partial_cmp(&a.0)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.1.title.cmp(&b.1.title))
                });
                Ok(scored.into_iter().map(|(_, doc)| doc).collect())
            }
            ProductQuery::AnyFieldRegex(pattern) => {
                let re = Self::compile(pattern)?;
                let mut matched: Vec<Product> = docs
                    .iter()
                    .filter(|doc| Self::regex_matches(doc, &re))
                    .cloned()
                    .collect();
                matched.sort_by(|a, b| a.title.cmp(&b.title));
                Ok(matched)
            }
        }
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn query(
        &self,
        query: &ProductQuery,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Product>> {
        Ok(self
            .matching(query)?
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count_documents(&self, query: &ProductQuery) -> Result<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn find_one_by_sku(&self, sku: &str) -> Result<Option<Product>> {
        Ok(self
            .docs
            .read()
            .iter()
            .find(|doc| doc.sku.as_deref() == Some(sku))
            .cloned())
    }

    async fn bulk_upsert(&self, ops: Vec<UpsertOp>) -> Result<()> {
        let mut docs = self.docs.write();
        for op in ops {
            match docs.iter_mut().find(|doc| op.filter.matches(doc)) {
                Some(existing) => existing.apply(&op.patch),
                None => docs.push(op.patch),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityFilter;

    fn doc(title: &str, category: &str, sku: &str) -> Product {
        Product {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            sku: Some(sku.to_string()),
            ..Default::default()
        }
    }

    fn op(patch: Product) -> UpsertOp {
        let filter = patch.identity().expect("indexable patch");
        UpsertOp { filter, patch }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let store = MemoryStore::new();

        let mut first = doc("Trail Shoes", "Footwear", "SKU-1");
        first.price = Some(10.0);
        store.bulk_upsert(vec![op(first)]).await.unwrap();
        assert_eq!(store.len(), 1);

        let mut second = doc("Trail Shoes", "Footwear", "SKU-1");
        second.price = Some(12.0);
        store.bulk_upsert(vec![op(second)]).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].price, Some(12.0));
    }

    #[tokio::test]
    async fn test_upsert_by_logical_key_collapses_duplicates() {
        let store = MemoryStore::new();

        let patch = Product {
            title: Some("Trail Shoes".to_string()),
            brand: Some("Acme".to_string()),
            ..Default::default()
        };
        store
            .bulk_upsert(vec![op(patch.clone()), op(patch)])
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(matches!(
            store.all()[0].identity(),
            Some(IdentityFilter::Logical { .. })
        ));
    }

    #[tokio::test]
    async fn test_title_match_outranks_product_type_match() {
        let store = MemoryStore::new();
        let by_type = Product {
            title: Some("Apron".to_string()),
            product_type: Some("shoes".to_string()),
            sku: Some("A-1".to_string()),
            ..Default::default()
        };
        let by_title = Product {
            title: Some("Running shoes".to_string()),
            sku: Some("B-2".to_string()),
            ..Default::default()
        };
        store
            .bulk_upsert(vec![op(by_type), op(by_title)])
            .await
            .unwrap();

        let hits = store
            .query(&ProductQuery::Text("shoes".to_string()), 0, 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].sku.as_deref(), Some("B-2"));
    }

    #[tokio::test]
    async fn test_regex_results_sorted_by_title() {
        let store = MemoryStore::new();
        store
            .bulk_upsert(vec![
                op(doc("Zest lamp", "lighting", "Z-1")),
                op(doc("Amber lamp", "lighting", "A-1")),
            ])
            .await
            .unwrap();

        let hits = store
            .query(&ProductQuery::AnyFieldRegex("light".to_string()), 0, 10)
            .await
            .unwrap();
        let titles: Vec<_> = hits.iter().filter_map(|p| p.title.as_deref()).collect();
        assert_eq!(titles, vec!["Amber lamp", "Zest lamp"]);
    }

    #[tokio::test]
    async fn test_count_is_independent_of_pagination() {
        let store = MemoryStore::new();
        for i in 0..7 {
            store
                .bulk_upsert(vec![op(doc(
                    &format!("Lamp {}", i),
                    "lighting",
                    &format!("L-{}", i),
                ))])
                .await
                .unwrap();
        }

        let query = ProductQuery::Text("lamp".to_string());
        assert_eq!(store.count_documents(&query).await.unwrap(), 7);
        let page = store.query(&query, 5, 5).await.unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_find_one_by_sku_is_exact() {
        let store = MemoryStore::new();
        store
            .bulk_upsert(vec![op(doc("Lamp", "lighting", "L-100"))])
            .await
            .unwrap();

        assert!(store.find_one_by_sku("L-100").await.unwrap().is_some());
        assert!(store.find_one_by_sku("L-10").await.unwrap().is_none());
    }
}
