//! Tool abstraction and registry.
//!
//! Every operation the server exposes implements [`Tool`] and is held in a
//! [`ToolRegistry`]. The registry drives both the discovery document
//! (`GET /discovery`) and dispatch (`POST /tools/{name}`).
//!
//! ```text
//! ┌──────────────────────────────┐
//! │         ToolRegistry         │
//! │  ┌────────────────────────┐  │
//! │  │ phase2-search          │  │
//! │  │  └─ SearchService      │  │
//! │  └────────────────────────┘  │
//! └──────────────┬───────────────┘
//!                ▼
//!          run_server() → HTTP API
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SearchError;
use crate::models::Query;
use crate::params::{ParameterDef, ParameterType};
use crate::search::SearchService;

/// A named, discoverable operation.
///
/// [`parameters`](Tool::parameters) is published for discovery and used to
/// validate arguments; [`execute`](Tool::execute) only ever sees arguments
/// that passed validation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's name, used as the route path (`POST /tools/{name}`).
    fn name(&self) -> &str;

    /// Returns a one-line description for discovery.
    fn description(&self) -> &str;

    /// Returns the declared parameter list.
    fn parameters(&self) -> Vec<ParameterDef>;

    /// Execute the tool with validated parameters.
    ///
    /// The returned value is serialized as the HTTP response body.
    async fn execute(&self, params: Map<String, Value>) -> Result<Value, SearchError>;
}

/// Serializable function entry for the discovery document.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterDef>,
    pub endpoint: String,
    pub http_method: String,
}

impl FunctionInfo {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
            endpoint: format!("/tools/{}", tool.name()),
            http_method: "POST".to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool
// ═══════════════════════════════════════════════════════════════════════

/// `phase2-search`: semantic search over the Phase2 website content.
pub struct SearchTool {
    service: SearchService,
}

impl SearchTool {
    pub const NAME: &'static str = "phase2-search";

    pub fn new(service: SearchService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Searches the Phase2 Technology website content using semantic vector search. \
         Returns relevant pages and content based on the query."
    }

    fn parameters(&self) -> Vec<ParameterDef> {
        vec![
            ParameterDef::new(
                "query",
                ParameterType::String,
                "The search query to find relevant Phase2 Technology content",
                true,
            ),
            ParameterDef::new(
                "limit",
                ParameterType::Integer,
                "Maximum number of results to return (default: 5, max: 20)",
                false,
            ),
        ]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, SearchError> {
        let text = params
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default();
        // Integers beyond i64 are clamped like any other oversize limit.
        let limit = params
            .get("limit")
            .and_then(|v| v.as_i64().or_else(|| v.as_u64().map(|_| i64::MAX)));

        let response = self.service.search(Query::new(text, limit)).await?;

        serde_json::to_value(&response)
            .map_err(|e| SearchError::Failed(format!("failed to encode response: {e}")))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of the tools served over HTTP.
///
/// # Example
///
/// ```rust,no_run
/// use phase2_search::search::SearchService;
/// use phase2_search::traits::{SearchTool, ToolRegistry};
///
/// # fn example(service: SearchService) {
/// let mut tools = ToolRegistry::new();
/// tools.register(Box::new(SearchTool::new(service)));
/// assert!(tools.find("phase2-search").is_some());
/// # }
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry holding the `phase2-search` tool.
    pub fn with_search(service: SearchService) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchTool::new(service)));
        registry
    }

    /// Register a tool. Duplicate names are kept; [`find`](Self::find)
    /// returns the first registered match.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Discovery entries for every registered tool, in registration order.
    pub fn functions(&self) -> Vec<FunctionInfo> {
        self.tools
            .iter()
            .map(|t| FunctionInfo::from_tool(t.as_ref()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::embedding::Embedder;
    use crate::error::ProviderError;
    use crate::models::{Document, EmbeddingVector};
    use crate::store::InMemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn model_name(&self) -> &str {
            "axis"
        }

        async fn embed(&self, _text: &str) -> Result<EmbeddingVector, ProviderError> {
            Ok(vec![1.0, 0.0])
        }
    }

    fn registry() -> ToolRegistry {
        let store = Arc::new(InMemoryStore::new());
        store.insert(
            Document {
                id: "1".into(),
                content: "Digital experience platforms".into(),
                drupal_entity_id: None,
                drupal_long_id: Some("entity:node/1:en".into()),
            },
            vec![1.0, 0.0],
        );
        let service = SearchService::new(Arc::new(AxisEmbedder), store, SearchConfig::default());
        ToolRegistry::with_search(service)
    }

    #[test]
    fn test_registry_find() {
        let tools = registry();
        assert_eq!(tools.len(), 1);
        assert!(tools.find("phase2-search").is_some());
        assert!(tools.find("search").is_none());
    }

    #[test]
    fn test_function_info() {
        let functions = registry().functions();
        assert_eq!(functions[0].endpoint, "/tools/phase2-search");
        assert_eq!(functions[0].http_method, "POST");
        let names: Vec<&str> = functions[0]
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["query", "limit"]);
        assert!(functions[0].parameters[0].required);
        assert!(!functions[0].parameters[1].required);
    }

    #[tokio::test]
    async fn test_search_tool_execute() {
        let tools = registry();
        let tool = tools.find(SearchTool::NAME).unwrap();
        let params = json!({ "query": "platforms", "limit": 3 });

        let value = tool
            .execute(params.as_object().unwrap().clone())
            .await
            .unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["query"], "platforms");
        assert_eq!(value["results"][0]["id"], "1");
        assert_eq!(value["results"][0]["drupal_long_id"], "entity:node/1:en");
    }
}
