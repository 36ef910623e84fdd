//! Core data models for the search pipeline.
//!
//! These types represent the query, the stored documents, and the ranked
//! results that flow from the tool boundary through the orchestrator.

use serde::{Deserialize, Serialize};

/// Fixed-length embedding produced by the provider for one query.
pub type EmbeddingVector = Vec<f32>;

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    /// Requested result count; `None` means the configured default.
    pub result_limit: Option<i64>,
}

impl Query {
    pub fn new(text: impl Into<String>, result_limit: Option<i64>) -> Self {
        Self {
            text: text.into(),
            result_limit,
        }
    }
}

/// A row of the document collection, minus its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drupal_entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drupal_long_id: Option<String>,
}

/// A document paired with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub document: Document,
    pub similarity: f64,
}

/// A single ranked result returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub document: Document,
    /// `1 - cosine_distance`, in `[-1, 1]`.
    pub similarity: f64,
}

impl From<Neighbor> for ScoredResult {
    fn from(n: Neighbor) -> Self {
        Self {
            document: n.document,
            similarity: n.similarity,
        }
    }
}

/// Response of the `phase2-search` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Ordered by descending similarity.
    pub results: Vec<ScoredResult>,
    pub query: String,
    /// Always `results.len()`.
    pub count: usize,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, results: Vec<ScoredResult>) -> Self {
        Self {
            count: results.len(),
            results,
            query: query.into(),
        }
    }
}
