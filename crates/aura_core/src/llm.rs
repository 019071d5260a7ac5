//! Completion-service interface.
//!
//! The emotion updater, memory compressor and session orchestrator all
//! depend on this capability trait rather than a concrete provider, so
//! any of them can run against a test double. Providers live in
//! `aura_reasoning::providers`.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Tool definition sent to the model so it can emit structured calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // usually "object"
    pub properties: Value, // JSON Schema
    pub required: Vec<String>,
}

/// Sampling parameters for one completion call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 250,
            temperature: 1.0,
            top_p: Some(0.9),
            top_k: Some(40),
        }
    }
}

impl From<&crate::config::LlmConfig> for GenerationParams {
    fn from(cfg: &crate::config::LlmConfig) -> Self {
        Self {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            top_k: cfg.top_k,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: Vec<ContentBlock>,
}

impl CompletionResponse {
    /// All text blocks concatenated.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if let ContentBlock::Text { text } = block {
                out.push_str(text);
            }
        }
        out
    }

    /// Structured tool calls in emission order.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// One request/response round against the hosted model, with optional
    /// system context and tool definitions. Transport and decode failures
    /// surface as errors; the caller decides whether they are fatal.
    async fn complete(
        &self,
        system: Option<&str>,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        params: &GenerationParams,
    ) -> Result<CompletionResponse>;

    /// Single-prompt convenience: one user message, no tools, text out.
    /// Used by the emotion scorer and the memory compressor.
    async fn complete_text(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let resp = self
            .complete(None, vec![Message::user_text(prompt)], Vec::new(), params)
            .await?;
        let text = resp.text();
        if text.trim().is_empty() {
            anyhow::bail!("completion returned no text");
        }
        Ok(text)
    }
}
