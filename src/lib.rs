//! Bulk product-catalog ingestion and low-latency search.
//!
//! The crate covers two pipelines over an injected document store and
//! cache:
//!
//! - **Ingestion**: delimited-text uploads are validated up front,
//!   streamed row by row into normalized patches, and upserted in large
//!   unordered batches with a bounded number of writes in flight.
//! - **Serving**: paginated full-text search with weighted relevance and
//!   a substring fallback, plus autocomplete suggestions sourced from a
//!   precomputed prefix ranking — both behind a read-through cache with
//!   short TTLs.
//!
//! The store and cache are capability traits ([`store::ProductStore`],
//! [`cache::CacheStore`]); in-memory implementations back the tests and
//! single-node setups, Redis backs the cache in production.

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod models;
pub mod search;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result, ValidationError};
pub use models::{IngestReport, Product, SearchResponse, SuggestResponse};
