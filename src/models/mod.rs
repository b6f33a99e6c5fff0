//! Canonical data model: the product record, its upsert identity rules,
//! and the response shapes served by the search and suggestion engines.

pub mod product;

pub use product::{IdentityFilter, Product, UpsertOp, REQUIRED_COLUMNS};

use serde::{Deserialize, Serialize};

/// Paginated search response, persisted verbatim as a cache entry
/// (with `cached` flipped to true on the cached copy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Matching products for the requested page
    pub items: Vec<Product>,

    /// Page number (1-based, clamped)
    pub page: u32,

    /// Page size (clamped to `[1, 50]`)
    pub limit: u32,

    /// Total matches across all pages
    pub total_items: u64,

    /// `ceil(total_items / limit)`, zero when nothing matched
    pub total_pages: u64,

    /// Wall time spent serving this response, in milliseconds
    pub took_ms: u64,

    /// Whether this response was served from cache
    pub cached: bool,
}

impl SearchResponse {
    /// An empty response for blank queries; touches neither cache nor store
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            limit,
            total_items: 0,
            total_pages: 0,
            took_ms: 0,
            cached: false,
        }
    }
}

/// Autocomplete response: up to ten terms, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

/// A scored autocomplete candidate
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionEntry {
    pub term: String,
    pub score: f64,
}

/// Successful ingestion summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub ok: bool,

    /// Rows that produced a non-empty patch and identity filter,
    /// whether the eventual upsert created or updated a document
    pub total_indexed: u64,
}
