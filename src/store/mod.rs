//! Product store capability: a text-indexed document store reached
//! through a trait so in-memory fakes can stand in during tests.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{Product, UpsertOp};
use async_trait::async_trait;

/// Relevance weights of the compound text index over
/// `{title, category, brand, sku, product_type}`. This weighting is a
/// compatibility contract for ranking order, not an implementation detail.
pub const TEXT_INDEX_WEIGHTS: [(&str, f64); 5] = [
    ("title", 10.0),
    ("category", 6.0),
    ("brand", 4.0),
    ("sku", 3.0),
    ("product_type", 2.0),
];

/// A store-side query over the product collection
#[derive(Debug, Clone, PartialEq)]
pub enum ProductQuery {
    /// Weighted text relevance over the indexed fields, results sorted
    /// by descending score
    Text(String),

    /// Case-insensitive regex matched against each indexed field,
    /// combined with OR across fields; results sorted ascending by title
    AnyFieldRegex(String),
}

/// Trait for product store operations
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Run a query with pagination, honoring the per-query sort order
    async fn query(&self, query: &ProductQuery, skip: usize, limit: usize)
        -> Result<Vec<Product>>;

    /// Count all matches independent of pagination
    async fn count_documents(&self, query: &ProductQuery) -> Result<u64>;

    /// Look up a single document by exact `sku`
    async fn find_one_by_sku(&self, sku: &str) -> Result<Option<Product>>;

    /// Apply a batch of upserts. Unordered: no operation's failure blocks
    /// independent operations in the same batch.
    async fn bulk_upsert(&self, ops: Vec<UpsertOp>) -> Result<()>;
}
