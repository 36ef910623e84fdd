//! Embedding provider abstraction.
//!
//! Defines the [`Embedder`] trait and the [`OpenAIProvider`] that calls the
//! OpenAI embeddings API. One call embeds one query; nothing is cached or
//! batched, and failures are returned immediately without retrying.
//!
//! Also provides [`cosine_similarity`], used by the in-memory store to
//! reproduce the database's `1 - (a <=> b)` scoring.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{ConfigError, ProviderError};
use crate::models::EmbeddingVector;

/// Converts text into a fixed-dimensionality vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a single text. Exactly one outbound call per invocation.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError>;
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Calls `POST {base_url}/embeddings`. The HTTP client is built once and
/// shared by every request handled by the process.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAIProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] when no API key is set.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ProviderError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        parse_openai_response(body)
    }
}

/// Extract the first `data[].embedding` from an embeddings API response.
fn parse_openai_response(json: serde_json::Value) -> Result<EmbeddingVector, ProviderError> {
    let parsed: EmbeddingResponse = serde_json::from_value(json)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let embedding = parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| ProviderError::InvalidResponse("no embedding returned".to_string()))?;

    if embedding.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "embedding vector is empty".to_string(),
        ));
    }

    Ok(embedding)
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors of
/// different lengths, or zero-magnitude vectors. Accumulates in `f64`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_first_embedding() {
        let body = json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.1, -0.2, 0.3] }],
            "model": "text-embedding-3-small"
        });
        let v = parse_openai_response(body).unwrap();
        assert_eq!(v, vec![0.1f32, -0.2, 0.3]);
    }

    #[test]
    fn test_parse_empty_data_is_error() {
        let err = parse_openai_response(json!({ "data": [] })).unwrap_err();
        assert!(err.to_string().contains("no embedding returned"));
    }

    #[test]
    fn test_parse_missing_data_is_error() {
        let err = parse_openai_response(json!({ "error": "nope" })).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_provider_requires_api_key() {
        let config = EmbeddingConfig::default();
        assert!(matches!(
            OpenAIProvider::new(&config),
            Err(ConfigError::MissingCredential("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
