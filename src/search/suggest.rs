//! Autocomplete suggestions: a precomputed prefix ranking consulted
//! first, live candidate scoring as the fallback, both merged through
//! the same descending-score, lexicographic-tie-break order.

use crate::cache::CacheStore;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::models::{SuggestResponse, SuggestionEntry};
use crate::search::pattern::flexible_pattern;
use crate::store::{ProductQuery, ProductStore};
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Suggestions returned per query
pub const MAX_SUGGESTIONS: usize = 10;

/// Candidates pulled from the store on the fallback path
const CANDIDATE_LIMIT: usize = 50;

/// Base score of the precomputed source; high enough that its entries
/// dominate any fallback score (fallback tops out at 67)
const PRECOMPUTED_BASE: f64 = 100.0;

/// Current-term prefixes shorter than this skip the precomputed lookup
const MIN_PREFIX_LEN: usize = 2;

const PREFIX_BONUS: f64 = 5.0;
const EXACT_BONUS: f64 = 10.0;
const PATTERN_BONUS: f64 = 2.0;

/// Autocomplete service
pub struct SuggestService {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn CacheStore>,
    suggestion_ttl: Duration,
}

impl SuggestService {
    pub fn new(
        store: Arc<dyn ProductStore>,
        cache: Arc<dyn CacheStore>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            store,
            cache,
            suggestion_ttl: Duration::from_secs(config.suggestion_ttl_secs),
        }
    }

    /// Suggest up to ten completion terms for a partial query
    pub async fn suggest(&self, query: &str) -> Result<SuggestResponse> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(SuggestResponse {
                suggestions: Vec::new(),
            });
        }

        let cache_key = format!("suggest:q={}", normalized);
        match self.cache.get(&cache_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(suggestions) => {
                    tracing::debug!(key = %cache_key, "suggestion cache hit");
                    return Ok(SuggestResponse { suggestions });
                }
                Err(e) => {
                    tracing::warn!(key = %cache_key, error = %e, "corrupted suggestion cache entry, recomputing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %cache_key, error = %e, "suggestion cache read failed, recomputing");
            }
        }

        let current_term = normalized
            .split_whitespace()
            .last()
            .unwrap_or(&normalized);

        let mut scores: HashMap<String, f64> = HashMap::new();

        if current_term.chars().count() >= MIN_PREFIX_LEN {
            let ranking_key = format!("sugg:{}", current_term);
            match self
                .cache
                .top_terms(&ranking_key, MAX_SUGGESTIONS)
                .await
            {
                Ok(terms) => {
                    // Descending from the base preserves the source order
                    // through the shared merge sort
                    for (rank, term) in terms.into_iter().take(MAX_SUGGESTIONS).enumerate() {
                        let score = PRECOMPUTED_BASE - rank as f64;
                        scores
                            .entry(term)
                            .and_modify(|existing| *existing = existing.max(score))
                            .or_insert(score);
                    }
                }
                Err(e) => {
                    tracing::warn!(key = %ranking_key, error = %e, "suggestion ranking read failed");
                }
            }
        }

        if scores.is_empty() {
            self.score_live_candidates(&normalized, &mut scores).await?;
        }

        let mut merged: Vec<SuggestionEntry> = scores
            .into_iter()
            .map(|(term, score)| SuggestionEntry { term, score })
            .collect();
        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        merged.truncate(MAX_SUGGESTIONS);

        let suggestions: Vec<String> = merged.into_iter().map(|entry| entry.term).collect();

        match serde_json::to_string(&suggestions) {
            Ok(serialized) => {
                if let Err(e) = self
                    .cache
                    .set_with_ttl(&cache_key, &serialized, self.suggestion_ttl)
                    .await
                {
                    tracing::warn!(key = %cache_key, error = %e, "suggestion cache write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize suggestions for cache"),
        }

        Ok(SuggestResponse { suggestions })
    }

    /// Fallback source: score field values of up to 50 documents
    /// matching the flexible pattern, keeping the best score per
    /// distinct value
    async fn score_live_candidates(
        &self,
        normalized: &str,
        scores: &mut HashMap<String, f64>,
    ) -> Result<()> {
        let pattern = flexible_pattern(normalized);
        let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(error = %e, "suggestion fallback pattern rejected");
                return Ok(());
            }
        };

        let candidates = self
            .store
            .query(&ProductQuery::AnyFieldRegex(pattern), 0, CANDIDATE_LIMIT)
            .await?;

        for candidate in &candidates {
            let fields: [(Option<&String>, f64); 5] = [
                (candidate.title.as_ref(), 50.0),
                (candidate.sku.as_ref(), 35.0),
                (candidate.brand.as_ref(), 40.0),
                (candidate.category.as_ref(), 30.0),
                (candidate.product_type.as_ref(), 20.0),
            ];

            for (value, base) in fields {
                let Some(value) = value else { continue };
                let lowered = value.to_lowercase();

                let mut score = base;
                if lowered.starts_with(normalized) {
                    score += PREFIX_BONUS;
                }
                if lowered == normalized {
                    score += EXACT_BONUS;
                }
                if re.is_match(value) {
                    score += PATTERN_BONUS;
                }

                scores
                    .entry(value.clone())
                    .and_modify(|existing| *existing = existing.max(score))
                    .or_insert(score);
            }
        }

        Ok(())
    }
}
