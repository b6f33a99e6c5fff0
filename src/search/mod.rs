//! Cache-aside search and autocomplete over the product store.
//!
//! A search request flows: cache lookup → (on miss) weighted relevance
//! query → substring fallback when nothing matched → exact-sku boost →
//! cache write. Suggestions flow the same way but consult a precomputed
//! prefix ranking before falling back to live candidate scoring. Cache
//! trouble is never an error on these paths; it degrades to a miss.

pub mod pattern;
pub mod service;
pub mod suggest;

pub use service::SearchService;
pub use suggest::SuggestService;
