//! Search orchestrator.
//!
//! [`SearchService`] runs the query pipeline:
//!
//! ```text
//! Query ──▶ validate ──▶ Embedder::embed ──▶ SimilarityStore::nearest_neighbors
//!                                                   │
//!           SearchResponse ◀── map rows ◀───────────┘
//! ```
//!
//! The embedding call always completes before the store is queried. There
//! are no retries and no partial results: the first failure aborts the
//! request and is reported as [`SearchError::Failed`].
//!
//! # Result limit
//!
//! | Requested | Effective |
//! |-----------|-----------|
//! | absent | `search.default_limit` (5) |
//! | `< 0` | rejected with [`SearchError::Validation`] |
//! | `0` | `0` (empty result set) |
//! | `> search.max_limit` | clamped to `search.max_limit` (20) |

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::embedding::Embedder;
use crate::error::SearchError;
use crate::models::{Query, ScoredResult, SearchResponse};
use crate::store::SimilarityStore;

/// Shared, stateless search pipeline.
///
/// Cloning is cheap; the embedder and store handles are reference-counted
/// and shared by all concurrent requests.
#[derive(Clone)]
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn SimilarityStore>,
    settings: SearchConfig,
}

impl SearchService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn SimilarityStore>,
        settings: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
        }
    }

    /// Apply the default and bounds to a requested result count.
    pub fn resolve_limit(&self, requested: Option<i64>) -> Result<i64, SearchError> {
        match requested {
            None => Ok(self.settings.default_limit),
            Some(n) if n < 0 => Err(SearchError::Validation(format!(
                "limit must be >= 0, got {n}"
            ))),
            Some(n) if n > self.settings.max_limit => {
                tracing::warn!(
                    requested = n,
                    max = self.settings.max_limit,
                    "limit above maximum, clamping"
                );
                Ok(self.settings.max_limit)
            }
            Some(n) => Ok(n),
        }
    }

    /// Run one search.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Validation`] for an empty query or negative limit.
    /// - [`SearchError::Failed`] if the embedding provider or the store fails.
    pub async fn search(&self, query: Query) -> Result<SearchResponse, SearchError> {
        if query.text.trim().is_empty() {
            return Err(SearchError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        let limit = self.resolve_limit(query.result_limit)?;

        let embedding = self.embedder.embed(&query.text).await.map_err(|e| {
            tracing::error!(error = %e, model = self.embedder.model_name(), "Search error: embedding failed");
            SearchError::from(e)
        })?;

        let neighbors = self
            .store
            .nearest_neighbors(&embedding, self.settings.match_threshold, limit)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Search error: similarity query failed");
                SearchError::from(e)
            })?;

        let results: Vec<ScoredResult> = neighbors.into_iter().map(ScoredResult::from).collect();

        tracing::debug!(
            query = %query.text,
            limit,
            threshold = self.settings.match_threshold,
            count = results.len(),
            "search completed"
        );

        Ok(SearchResponse::new(query.text, results))
    }
}
