//! Tool registry and built-in tools for the dialogue loop.
//!
//! Tools are resolved inside a turn's bounded tool loop; a tool failure
//! is reported back to the model as an error result, never thrown at the
//! session.

use anyhow::Context;
use aura_core::config::SearchConfig;
use aura_core::llm::{Tool, ToolInputSchema};
use aura_core::store::SimilaritySearch;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of one tool execution, fed back into the model.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Per-dispatch context supplied by the owning session.
#[derive(Debug, Clone, Default)]
pub struct ToolInvocation {
    pub user_id: Option<String>,
}

#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique name used for dispatch (must match the schema's tool name).
    fn name(&self) -> &str;

    /// JSON schema sent to the LLM so it knows how to call this tool.
    fn schema(&self) -> Tool;

    async fn execute(&self, input: &Value, ctx: &ToolInvocation) -> ToolOutcome;
}

#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Overwrites any existing handler with the same name.
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) {
        let name = handler.name().to_string();
        tracing::debug!("registered tool: {}", name);
        self.handlers.insert(name, handler);
    }

    pub fn schemas(&self) -> Vec<Tool> {
        self.handlers.values().map(|h| h.schema()).collect()
    }

    pub async fn dispatch(&self, name: &str, input: &Value, ctx: &ToolInvocation) -> ToolOutcome {
        match self.handlers.get(name) {
            Some(handler) => handler.execute(input, ctx).await,
            None => ToolOutcome::error(format!("Unknown tool: {}", name)),
        }
    }
}

fn query_schema(description: &str) -> ToolInputSchema {
    ToolInputSchema {
        schema_type: "object".to_string(),
        properties: json!({
            "query": { "type": "string", "description": description }
        }),
        required: vec!["query".to_string()],
    }
}

// ============================================================================
// Web search
// ============================================================================

/// Search the web through a Perplexity-style chat completions endpoint.
pub struct WebSearchTool {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl WebSearchTool {
    pub fn new(cfg: &SearchConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key: std::env::var("PERPLEXITY_API_KEY").ok(),
        }
    }

    async fn search(&self, query: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("PERPLEXITY_API_KEY is not set")?;
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful web search assistant. Provide factual, \
                        up-to-date information with sources when available."
                },
                { "role": "user", "content": query }
            ]
        });
        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .context("web search request failed")?
            .error_for_status()
            .context("web search returned an error status")?;
        let body: Value = resp.json().await.context("invalid web search response")?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .context("web search response missing content")
    }
}

#[async_trait::async_trait]
impl ToolHandler for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn schema(&self) -> Tool {
        Tool {
            name: "search_web".to_string(),
            description: "Search the internet for up-to-date information. Useful for current \
                events, facts that might have changed, or anything you're uncertain about."
                .to_string(),
            input_schema: query_schema("The search query to look up on the web."),
        }
    }

    async fn execute(&self, input: &Value, _ctx: &ToolInvocation) -> ToolOutcome {
        let Some(query) = input.get("query").and_then(|q| q.as_str()) else {
            return ToolOutcome::error("search_web requires a 'query' string");
        };
        match self.search(query).await {
            Ok(result) => ToolOutcome::ok(result),
            Err(e) => {
                tracing::warn!(error = %e, "web search failed");
                ToolOutcome::error(format!("web search failed: {}", e))
            }
        }
    }
}

// ============================================================================
// Memory lookup
// ============================================================================

/// Retrieve memories other users shared, via the similarity-search
/// collaborator. The current user's own memories are excluded.
pub struct RecallTool {
    search: Arc<dyn SimilaritySearch>,
    top_k: usize,
}

impl RecallTool {
    pub fn new(search: Arc<dyn SimilaritySearch>, top_k: usize) -> Self {
        Self { search, top_k }
    }

    async fn recall(&self, query: &str, exclude_user: Option<&str>) -> anyhow::Result<String> {
        let vector = self.search.embed(query).await?;
        let hits = self.search.query(&vector, self.top_k, exclude_user).await?;
        if hits.is_empty() {
            return Ok("No relevant information from other people was found.".to_string());
        }
        Ok(hits
            .iter()
            .map(|h| format!("- {}", h.text))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[async_trait::async_trait]
impl ToolHandler for RecallTool {
    fn name(&self) -> &str {
        "recall_memories"
    }

    fn schema(&self) -> Tool {
        Tool {
            name: "recall_memories".to_string(),
            description: "Search memories that other people have shared and return relevant \
                snippets. Useful for gossip, opinions, or experiences of others. Never returns \
                the current person's own memories."
                .to_string(),
            input_schema: query_schema("Text to search for similar memories."),
        }
    }

    async fn execute(&self, input: &Value, ctx: &ToolInvocation) -> ToolOutcome {
        let Some(query) = input.get("query").and_then(|q| q.as_str()) else {
            return ToolOutcome::error("recall_memories requires a 'query' string");
        };
        match self.recall(query, ctx.user_id.as_deref()).await {
            Ok(result) => ToolOutcome::ok(result),
            Err(e) => {
                tracing::warn!(error = %e, "memory recall failed");
                ToolOutcome::error(format!("memory recall failed: {}", e))
            }
        }
    }
}
