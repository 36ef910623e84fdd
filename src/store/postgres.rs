//! pgvector-backed [`SimilarityStore`].
//!
//! Issues a single parameterized query per search against the document
//! table. pgvector's `<=>` operator is cosine distance, so similarity is
//! computed in SQL as `1 - (embedding <=> $1::vector)` and rows are ordered
//! by ascending distance.
//!
//! Connections are leased from the shared [`PgPool`] for the duration of
//! one query and returned on every exit path.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::error::StoreError;
use crate::models::{Document, Neighbor};

use super::SimilarityStore;

pub struct PgVectorStore {
    pool: PgPool,
    neighbors_sql: String,
}

impl PgVectorStore {
    /// `table` must already be validated as a plain identifier.
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            neighbors_sql: neighbors_query(table),
        }
    }

    /// Close the pool, waiting for leased connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn neighbors_query(table: &str) -> String {
    format!(
        r#"
        SELECT id::text AS id,
               content::text AS content,
               drupal_entity_id::text AS drupal_entity_id,
               drupal_long_id::text AS drupal_long_id,
               (1 - (embedding <=> $1::vector))::float8 AS similarity
        FROM "{table}"
        WHERE 1 - (embedding <=> $1::vector) > $2
        ORDER BY embedding <=> $1::vector
        LIMIT $3
        "#
    )
}

/// Render a vector in pgvector's text input format: `[0.1,0.2,0.3]`.
fn vector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Decode one result row, rejecting rows of the wrong shape.
fn decode_row(row: &PgRow) -> Result<Neighbor, StoreError> {
    let id: Option<String> = row.try_get("id")?;
    let content: Option<String> = row.try_get("content")?;
    let similarity: Option<f64> = row.try_get("similarity")?;

    let (id, similarity) = required_fields(id, similarity)?;

    Ok(Neighbor {
        document: Document {
            id,
            content: content.unwrap_or_default(),
            drupal_entity_id: non_empty(row.try_get("drupal_entity_id")?),
            drupal_long_id: non_empty(row.try_get("drupal_long_id")?),
        },
        similarity,
    })
}

/// A row must carry an id and a finite similarity.
fn required_fields(
    id: Option<String>,
    similarity: Option<f64>,
) -> Result<(String, f64), StoreError> {
    let id = id.ok_or_else(|| StoreError::Decode("row has NULL id".to_string()))?;
    let similarity = similarity
        .filter(|s| s.is_finite())
        .ok_or_else(|| StoreError::Decode(format!("row {id} has no finite similarity")))?;
    Ok((id, similarity))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl SimilarityStore for PgVectorStore {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<Neighbor>, StoreError> {
        let rows = sqlx::query(&self.neighbors_sql)
            .bind(vector_literal(vector))
            .bind(threshold)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_query_quotes_table_and_orders_by_distance() {
        let sql = neighbors_query("Phase2Website");
        assert!(sql.contains(r#"FROM "Phase2Website""#));
        assert!(sql.contains("WHERE 1 - (embedding <=> $1::vector) > $2"));
        assert!(sql.contains("ORDER BY embedding <=> $1::vector"));
        assert!(sql.contains("LIMIT $3"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("n/1".into())), Some("n/1".into()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_required_fields() {
        let (id, similarity) = required_fields(Some("12".into()), Some(0.82)).unwrap();
        assert_eq!(id, "12");
        assert_eq!(similarity, 0.82);

        let err = required_fields(None, Some(0.9)).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
        assert_eq!(err.to_string(), "malformed store row: row has NULL id");

        assert!(matches!(
            required_fields(Some("12".into()), None),
            Err(StoreError::Decode(_))
        ));
        assert!(matches!(
            required_fields(Some("12".into()), Some(f64::NAN)),
            Err(StoreError::Decode(_))
        ));
        let err = required_fields(Some("12".into()), Some(f64::INFINITY)).unwrap_err();
        assert!(err.to_string().contains("row 12 has no finite similarity"));
    }
}
