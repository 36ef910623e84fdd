//! # Phase2 Search
//!
//! Semantic search over the Phase2 Technology website content, exposed as a
//! discoverable tool over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────────┐
//! │  Caller  │──▶│ HTTP server  │──▶│  Search  │──▶│  Embedder   │
//! │          │◀──│ (discovery)  │◀──│ Service  │   │  (OpenAI)   │
//! └──────────┘   └──────────────┘   └────┬─────┘   └─────────────┘
//!                                        ▼
//!                                  ┌───────────┐
//!                                  │ Postgres  │
//!                                  │ pgvector  │
//!                                  └───────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **server** ([`server`]) validates the call against the tool's
//!    declared parameters ([`params`]) and dispatches it through the
//!    [`traits::ToolRegistry`].
//! 2. The **search service** ([`search`]) embeds the query text via the
//!    [`embedding::Embedder`].
//! 3. The **similarity store** ([`store`]) returns documents above the match
//!    threshold, most similar first.
//! 4. Rows are mapped to [`models::ScoredResult`]s and returned as a
//!    [`models::SearchResponse`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`db`] | Postgres connection pool |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`error`] | Error taxonomy |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`models`] | Core data types |
//! | [`params`] | Tool parameter declaration and validation |
//! | [`search`] | Search orchestrator |
//! | [`server`] | HTTP server |
//! | [`store`] | Similarity store trait and backends |
//! | [`traits`] | Tool trait and registry |

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod models;
pub mod params;
pub mod search;
pub mod server;
pub mod store;
pub mod traits;
