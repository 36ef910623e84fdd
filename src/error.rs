//! Error taxonomy for the search pipeline.
//!
//! | Error | Raised by | Surfaces as |
//! |-------|-----------|-------------|
//! | [`ConfigError`] | [`load_config`](crate::config::load_config) | process exits before serving |
//! | [`ProviderError`] | [`Embedder`](crate::embedding::Embedder) | [`SearchError::Failed`] |
//! | [`StoreError`] | [`SimilarityStore`](crate::store::SimilarityStore) | [`SearchError::Failed`] |
//! | [`SearchError`] | [`SearchService`](crate::search::SearchService) | HTTP `400` / `500` |

use thiserror::Error;

/// Startup configuration is incomplete or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The embedding provider call failed or returned no vector.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// The similarity store could not answer a query.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed store row: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_) => StoreError::Decode(err.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// User-facing error returned by the search pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed or missing invocation parameters.
    #[error("{0}")]
    Validation(String),

    /// Any failure of the embedding or store call, carrying the proximate cause.
    #[error("Failed to search Phase2 content: {0}")]
    Failed(String),
}

impl From<ProviderError> for SearchError {
    fn from(err: ProviderError) -> Self {
        SearchError::Failed(err.to_string())
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        SearchError::Failed(err.to_string())
    }
}
