//! Similarity store abstraction.
//!
//! The [`SimilarityStore`] trait is the only storage interface the search
//! pipeline depends on. Two backends implement it:
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | [`PgVectorStore`] | [`postgres`] | production, pgvector `<=>` cosine distance |
//! | [`InMemoryStore`] | [`memory`] | tests and local runs, brute-force cosine |
//!
//! Implementations must be `Send + Sync`; a single instance is shared by
//! every concurrent request.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Neighbor;

pub use memory::InMemoryStore;
pub use postgres::PgVectorStore;

#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Return documents whose similarity to `vector` is strictly greater
    /// than `threshold`, most similar first, at most `limit` rows.
    ///
    /// Similarity is `1 - cosine_distance`. Ties keep the store's order.
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<Neighbor>, StoreError>;

    /// Cheap reachability probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
