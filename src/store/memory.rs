//! In-memory [`SimilarityStore`] for tests and local runs.
//!
//! Uses a `Vec` behind `std::sync::RwLock`. Vector search is brute-force
//! cosine similarity over every stored document, sorted stably so that ties
//! keep insertion order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::StoreError;
use crate::models::{Document, EmbeddingVector, Neighbor};

use super::SimilarityStore;

struct StoredDocument {
    document: Document,
    embedding: EmbeddingVector,
}

pub struct InMemoryStore {
    documents: RwLock<Vec<StoredDocument>>,
    available: AtomicBool,
    queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            queries: AtomicUsize::new(0),
        }
    }

    /// Insert a document, replacing any existing one with the same id.
    pub fn insert(&self, document: Document, embedding: EmbeddingVector) {
        let mut docs = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        docs.retain(|d| d.document.id != document.id);
        docs.push(StoredDocument {
            document,
            embedding,
        });
    }

    /// Simulate the store going offline (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of neighbor queries received so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimilarityStore for InMemoryStore {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<Neighbor>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let docs = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut neighbors: Vec<Neighbor> = docs
            .iter()
            .filter_map(|stored| {
                let similarity = cosine_similarity(vector, &stored.embedding);
                (similarity > threshold).then(|| Neighbor {
                    document: stored.document.clone(),
                    similarity,
                })
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(neighbors)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
