//! Scripted mock provider — deterministic responses for tests without
//! API keys. Each call pops the next scripted response; the recorded
//! calls let tests assert on the prompts actually sent.

use aura_core::llm::{
    CompletionClient, CompletionResponse, ContentBlock, GenerationParams, Message, Tool,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Scripted {
    Response(CompletionResponse),
    Error(String),
}

/// One observed `complete` invocation.
pub struct RecordedCall {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

#[derive(Default)]
pub struct MockClient {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain text response.
    pub fn push_text(&self, text: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(CompletionResponse {
                content: vec![ContentBlock::Text {
                    text: text.to_string(),
                }],
            }));
    }

    /// Queue a structured tool call.
    pub fn push_tool_call(&self, name: &str, input: Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Response(CompletionResponse {
                content: vec![ContentBlock::ToolUse {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    input,
                }],
            }));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(message.to_string()));
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl CompletionClient for MockClient {
    async fn complete(
        &self,
        system: Option<&str>,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        _params: &GenerationParams,
    ) -> anyhow::Result<CompletionResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.map(|s| s.to_string()),
            messages,
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Error(msg)) => anyhow::bail!("{}", msg),
            None => anyhow::bail!("mock script exhausted"),
        }
    }
}
