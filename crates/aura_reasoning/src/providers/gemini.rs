//! Gemini `generateContent` provider.
//!
//! Maps the provider-neutral message/tool types onto Gemini's REST wire
//! format, including function-calling mode. Without an API key the client
//! degrades to a canned mock response so the rest of the stack can be
//! exercised offline.

use crate::retry::{with_retry, RetryPolicy};
use anyhow::{Context, Result};
use aura_core::llm::{
    CompletionClient, CompletionResponse, ContentBlock, GenerationParams, Message, Role, Tool,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(model: &str, base_url: Option<&str>) -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY").unwrap_or_else(|_| "mock".to_string());
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_key,
            model: model.to_string(),
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[async_trait::async_trait]
impl CompletionClient for GeminiClient {
    #[tracing::instrument(skip(self, system, messages, tools, params), fields(model = %self.model))]
    async fn complete(
        &self,
        system: Option<&str>,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        params: &GenerationParams,
    ) -> Result<CompletionResponse> {
        if self.api_key == "mock" {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            return Ok(CompletionResponse {
                content: vec![ContentBlock::Text {
                    text: format!("(Mock {} response) I received your prompt.", self.model),
                }],
            });
        }

        let mut body = json!({
            "contents": contents_payload(&messages),
            "generationConfig": generation_config(params),
        });
        if let Some(system) = system {
            body["system_instruction"] = json!({ "parts": [{ "text": system }] });
        }
        if !tools.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": declarations(&tools) }]);
        }

        let policy = RetryPolicy::default();
        let url = self.endpoint();
        let client = &self.client;
        let response = with_retry(&policy, "Gemini", || async {
            let resp = client
                .post(&url)
                .json(&body)
                .send()
                .await
                .context("Failed to send request to Gemini")?;
            Ok(resp)
        })
        .await?;

        let payload: Value = response
            .json()
            .await
            .context("Failed to decode Gemini response")?;
        parse_response(&payload)
    }
}

fn generation_config(params: &GenerationParams) -> Value {
    let mut cfg = json!({
        "temperature": params.temperature,
        "maxOutputTokens": params.max_tokens,
    });
    if let Some(top_p) = params.top_p {
        cfg["topP"] = json!(top_p);
    }
    if let Some(top_k) = params.top_k {
        cfg["topK"] = json!(top_k);
    }
    cfg
}

/// Gemini has no tool-call ids; function responses are matched by name.
/// Resolve a `tool_use_id` back to the name of the call that produced it.
fn resolve_call_name<'a>(messages: &'a [Message], tool_use_id: &str) -> Option<&'a str> {
    for message in messages {
        for block in &message.content {
            if let ContentBlock::ToolUse { id, name, .. } = block {
                if id == tool_use_id {
                    return Some(name);
                }
            }
        }
    }
    None
}

fn contents_payload(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            let parts: Vec<Value> = message
                .content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => json!({ "text": text }),
                    ContentBlock::ToolUse { name, input, .. } => json!({
                        "functionCall": { "name": name, "args": input }
                    }),
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } => {
                        let name = resolve_call_name(messages, tool_use_id).unwrap_or("unknown");
                        json!({
                            "functionResponse": {
                                "name": name,
                                "response": { "content": content }
                            }
                        })
                    }
                })
                .collect();
            json!({ "role": role, "parts": parts })
        })
        .collect()
}

fn declarations(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": {
                    "type": tool.input_schema.schema_type,
                    "properties": tool.input_schema.properties,
                    "required": tool.input_schema.required,
                }
            })
        })
        .collect()
}

fn parse_response(payload: &Value) -> Result<CompletionResponse> {
    let parts = payload
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .with_context(|| format!("invalid or empty Gemini response: {}", payload))?;

    let mut content = Vec::new();
    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            content.push(ContentBlock::Text {
                text: text.to_string(),
            });
        } else if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();
            let input = call.get("args").cloned().unwrap_or_else(|| json!({}));
            content.push(ContentBlock::ToolUse {
                id: uuid::Uuid::new_v4().to_string(),
                name,
                input,
            });
        }
    }

    if content.is_empty() {
        anyhow::bail!("Gemini response contained no usable parts");
    }
    Ok(CompletionResponse { content })
}
