//! HTTP boundary.
//!
//! Exposes the registered tools to the calling framework and a liveness
//! probe for the hosting platform.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/discovery` | List registered tools with their parameter lists |
//! | `POST` | `/tools/{name}` | Call a registered tool by name |
//! | `GET`  | `/health` | Store reachability (`200` healthy / `503` unhealthy) |
//!
//! # Calling a tool
//!
//! The body is either `{ "parameters": { ... } }` or the bare parameters
//! object. The tool's result is returned as the response body:
//!
//! ```json
//! { "results": [ { "id": "12", "content": "...", "similarity": 0.82 } ], "query": "homepage redesign", "count": 1 }
//! ```
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing required parameter: query" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::embedding::OpenAIProvider;
use crate::error::{ConfigError, SearchError};
use crate::params::validate_params;
use crate::search::SearchService;
use crate::store::{PgVectorStore, SimilarityStore};
use crate::traits::{FunctionInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    tools: Arc<ToolRegistry>,
    store: Arc<dyn SimilarityStore>,
}

impl AppState {
    pub fn new(tools: Arc<ToolRegistry>, store: Arc<dyn SimilarityStore>) -> Self {
        Self { tools, store }
    }
}

/// Process-wide resources created once at startup.
pub struct Services {
    pub search: SearchService,
    pub store: Arc<PgVectorStore>,
}

/// Build the provider client, the connection pool, and the search service.
///
/// Nothing is contacted yet; the pool connects on first use.
pub fn build_services(config: &Config) -> Result<Services, ConfigError> {
    let pool = db::connect(&config.db)?;
    let store = Arc::new(PgVectorStore::new(pool, &config.db.table));
    let embedder = Arc::new(OpenAIProvider::new(&config.embedding)?);
    let search = SearchService::new(embedder, store.clone(), config.search.clone());

    Ok(Services { search, store })
}

/// Assemble the router for the given tools and store.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/discovery", get(handle_discovery))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server and blocks until SIGTERM or Ctrl-C.
///
/// On shutdown, in-flight requests are allowed to finish and the
/// connection pool is then closed.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let services = build_services(config)?;
    let tools = Arc::new(ToolRegistry::with_search(services.search));
    let app = build_router(AppState::new(tools.clone(), services.store.clone()));

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let port = listener.local_addr()?.port();

    tracing::info!("Phase2 Search service running on port {}", port);
    tracing::info!("Discovery endpoint: http://localhost:{}/discovery", port);
    tracing::info!("Health check: http://localhost:{}/health", port);
    for t in tools.tools() {
        tracing::info!("  POST /tools/{}: {}", t.name(), t.description());
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("closing database pool");
    services.store.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl-C received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(message) => bad_request(message),
            failed @ SearchError::Failed(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "tool_error",
                message: failed.to_string(),
            },
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// Handler for `GET /health`. Never fails; an unreachable store yields `503`.
async fn handle_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "disconnected",
                }),
            )
        }
    }
}

// ============ GET /discovery ============

#[derive(Serialize)]
struct DiscoveryResponse {
    functions: Vec<FunctionInfo>,
}

async fn handle_discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        functions: state.tools.functions(),
    })
}

// ============ POST /tools/{name} ============

/// Handler for `POST /tools/{name}`.
///
/// Looks up the tool, validates parameters against its declared list, and
/// executes it. Returns `404` for an unknown tool, `400` for a body that is
/// not JSON or for invalid parameters, and `500` when the tool fails.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let Json(body) = body?;
    let args = unwrap_parameters(body);
    let params = validate_params(&tool.parameters(), &args)?;

    let result = tool.execute(params).await?;
    Ok(Json(result))
}

/// Accept both `{ "parameters": {...} }` and a bare parameters object.
fn unwrap_parameters(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("parameters").is_some_and(Value::is_object) => {
            map.remove("parameters").unwrap_or(Value::Null)
        }
        other => other,
    }
}
