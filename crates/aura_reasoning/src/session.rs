//! Session orchestrator: one conversation's lifecycle.
//!
//! Per turn: homeostatic drift catch-up → append the user turn → reactive
//! emotion update (non-fatal) → bounded dialogue/tool loop → formatted
//! reply. At session end: one memory compression over the full transcript,
//! then the final emotion state is persisted and the session is consumed.
//!
//! All conversation state lives on the session object — there is no
//! process-wide mutable chat history.

use crate::tools::{ToolInvocation, ToolRegistry};
use aura_core::config::{AuraConfig, MergeMode};
use aura_core::emotion::{EmotionSpace, EmotionVector};
use aura_core::llm::{
    CompletionClient, ContentBlock, GenerationParams, Message, Role, Tool, ToolInputSchema,
};
use aura_core::prompt::{PromptSet, SystemPromptParams};
use aura_core::transcript::Transcript;
use aura_limbic::drift::{DriftConfig, DriftEngine, DriftState};
use aura_limbic::reactive::ReactiveUpdater;
use aura_memory::compressor::MemoryCompressor;
use aura_memory::profile::ProfileStore;
use std::sync::Arc;

/// The name of the built-in reply tool. A `speak` call carries the
/// user-visible message; resolving it ends the tool loop.
const SPEAK_TOOL: &str = "speak";

/// Per-deployment orchestration settings, derived from [`AuraConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub persona_name: String,
    pub persona_instructions: String,
    pub dialogue_params: GenerationParams,
    pub scoring_params: GenerationParams,
    pub memory_params: GenerationParams,
    pub merge: MergeMode,
    /// Hard cap on dialogue/tool rounds per turn.
    pub max_tool_rounds: usize,
    /// Drop tool bookkeeping from text handed to the scorer/compressor.
    pub exclude_tool_outputs: bool,
    pub drift: DriftConfig,
    /// Also maintain the globally shared self-model record.
    pub central_memory: bool,
}

impl SessionConfig {
    pub fn from_config(cfg: &AuraConfig) -> Self {
        Self {
            persona_name: cfg.persona.name.clone(),
            persona_instructions: cfg.persona.instructions.clone(),
            dialogue_params: GenerationParams::from(&cfg.llm),
            scoring_params: GenerationParams {
                max_tokens: cfg.limbic.max_tokens,
                temperature: cfg.limbic.temperature,
                ..Default::default()
            },
            memory_params: GenerationParams {
                max_tokens: cfg.memory.max_tokens,
                temperature: cfg.memory.temperature,
                ..Default::default()
            },
            merge: cfg.memory.merge.clone(),
            max_tool_rounds: 5,
            exclude_tool_outputs: cfg.limbic.exclude_tool_outputs,
            drift: DriftConfig::from(&cfg.limbic),
            central_memory: cfg.memory.central_memory,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&AuraConfig::default())
    }
}

/// Shared collaborators handed to every session.
pub struct SessionContext {
    pub dialogue: Arc<dyn CompletionClient>,
    pub scorer: Arc<dyn CompletionClient>,
    pub summarizer: Arc<dyn CompletionClient>,
    pub profile: Arc<ProfileStore>,
    pub tools: Arc<ToolRegistry>,
    pub prompts: PromptSet,
    pub config: SessionConfig,
}

/// Outcome of closing a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionClose {
    pub memory_saved: bool,
    pub emotions_saved: bool,
}

pub struct Session {
    ctx: Arc<SessionContext>,
    user_id: String,
    transcript: Transcript,
    /// API-shaped scratchpad mirroring the transcript, including tool
    /// invocation/result blocks, sent to the dialogue model each round.
    history: Vec<Message>,
    /// Per-session emotion space: the configured dimensions with this
    /// user's stored baseline as the drift attractor.
    space: EmotionSpace,
    emotions: EmotionVector,
    drift_state: DriftState,
    engine: DriftEngine,
    updater: ReactiveUpdater,
    compressor: MemoryCompressor,
}

impl Session {
    /// Load (or first-contact seed) the user's persisted state and start a
    /// fresh conversation.
    pub async fn open(ctx: Arc<SessionContext>, user_id: &str) -> anyhow::Result<Self> {
        let now = chrono::Utc::now().timestamp();
        let profile = &ctx.profile;

        let emotions = profile.emotions(user_id).await?;
        let mut drift_state = profile.drift_state(user_id, now).await?;
        // Sensitivity is user-editable between sessions; refresh it.
        drift_state.sensitivity = profile.sensitivity(user_id).await?;

        let mut space = profile.space().clone();
        space.baseline = profile.base_emotions(user_id).await?.values().to_vec();

        let updater = ReactiveUpdater::new(ctx.prompts.clone(), ctx.config.scoring_params.clone());
        let compressor = MemoryCompressor::new(
            ctx.prompts.clone(),
            ctx.config.memory_params.clone(),
            ctx.config.merge.clone(),
        );
        let engine = DriftEngine::new(ctx.config.drift);
        let transcript = Transcript::new(&ctx.config.persona_name);

        Ok(Self {
            ctx,
            user_id: user_id.to_string(),
            transcript,
            history: Vec::new(),
            space,
            emotions,
            drift_state,
            engine,
            updater,
            compressor,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn emotions(&self) -> &EmotionVector {
        &self.emotions
    }

    pub fn space(&self) -> &EmotionSpace {
        &self.space
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Drive one turn. Returns the reply as short message chunks; an empty
    /// vec means the agent chose silence. A dialogue-call failure is
    /// propagated once from here; everything emotional is best-effort.
    pub async fn send(&mut self, message: &str) -> anyhow::Result<Vec<String>> {
        // Wall clock captured once so the gate can't race concurrent writes.
        let now = chrono::Utc::now().timestamp();
        let steps = self.engine.advance(
            &mut self.emotions,
            &mut self.drift_state,
            &self.space,
            now,
            &mut rand::thread_rng(),
        );
        if steps > 0 {
            self.ctx
                .profile
                .persist_emotions_best_effort(&self.user_id, &self.emotions, &self.drift_state)
                .await;
        }

        self.transcript.push_user(message);
        self.history.push(Message::user_text(message));

        // Reactive update: a failure keeps the prior vector and the turn
        // proceeds.
        let scored_text = self.transcript.render(self.ctx.config.exclude_tool_outputs);
        match self
            .updater
            .update(
                self.ctx.scorer.as_ref(),
                &self.emotions,
                &self.space,
                &scored_text,
                self.drift_state.sensitivity,
            )
            .await
        {
            Ok(updated) => {
                self.emotions = updated;
                self.ctx
                    .profile
                    .persist_emotions_best_effort(&self.user_id, &self.emotions, &self.drift_state)
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "reactive emotion update failed, keeping prior state");
            }
        }

        let reply = self.dialogue_loop().await?;
        let chunks = match reply {
            Some(text) => format_reply(&text),
            None => {
                tracing::info!("turn produced no reply, staying silent");
                Vec::new()
            }
        };
        if !chunks.is_empty() {
            self.transcript.push_agent(&chunks.join("\n"));
        }
        Ok(chunks)
    }

    /// The bounded dialogue/tool loop. Exhausting the round cap without a
    /// reply is silence, not an error.
    async fn dialogue_loop(&mut self) -> anyhow::Result<Option<String>> {
        let system = self.system_prompt().await;
        let mut tools = self.ctx.tools.schemas();
        tools.push(speak_tool());

        let mut reply: Option<String> = None;
        for _round in 0..self.ctx.config.max_tool_rounds {
            let response = self
                .ctx
                .dialogue
                .complete(
                    Some(&system),
                    self.history.clone(),
                    tools.clone(),
                    &self.ctx.config.dialogue_params,
                )
                .await?;

            self.history.push(Message {
                role: Role::Assistant,
                content: response.content.clone(),
            });

            let tool_uses: Vec<(String, String, serde_json::Value)> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            if tool_uses.is_empty() {
                let text = response.text();
                let text = text.trim();
                if !text.is_empty() {
                    reply = Some(text.to_string());
                }
                break;
            }

            let mut results = Vec::new();
            for (id, name, input) in &tool_uses {
                self.transcript.push_tool_call(&format!("{}({})", name, input));
                let outcome_text = if name == SPEAK_TOOL {
                    let message = input
                        .get("message")
                        .and_then(|m| m.as_str())
                        .unwrap_or_default();
                    if !message.trim().is_empty() {
                        reply = Some(message.to_string());
                    }
                    "delivered".to_string()
                } else {
                    let outcome = self
                        .ctx
                        .tools
                        .dispatch(
                            name,
                            input,
                            &ToolInvocation {
                                user_id: Some(self.user_id.clone()),
                            },
                        )
                        .await;
                    if outcome.is_error {
                        tracing::warn!(tool = %name, "tool call failed: {}", outcome.content);
                    }
                    results.push(ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: outcome.content.clone(),
                        is_error: if outcome.is_error { Some(true) } else { None },
                    });
                    self.transcript.push_tool_result(&outcome.content);
                    continue;
                };
                self.transcript.push_tool_result(&outcome_text);
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: outcome_text,
                    is_error: None,
                });
            }
            self.history.push(Message {
                role: Role::User,
                content: results,
            });

            if reply.is_some() {
                break;
            }
        }
        Ok(reply)
    }

    /// Assemble system context: persona + current emotion summary + stored
    /// memory + the user's custom instructions. Store failures degrade to
    /// defaults rather than killing the turn.
    async fn system_prompt(&self) -> String {
        let memory = match self.ctx.profile.user_memory(&self.user_id).await {
            Ok(memory) => memory,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read user memory for prompt");
                String::new()
            }
        };
        let custom = match self.ctx.profile.custom_instructions(&self.user_id).await {
            Ok(custom) => custom,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read custom instructions for prompt");
                "N/A".to_string()
            }
        };

        let mut persona = self.ctx.config.persona_instructions.clone();
        if self.ctx.config.central_memory {
            if let Ok(self_model) = self.ctx.profile.central_memory().await {
                persona.push_str("\n\nWhat you know about yourself:\n");
                persona.push_str(&self_model);
            }
        }

        self.ctx.prompts.render_system(&SystemPromptParams {
            persona: &persona,
            emotional_state: &self.emotions.describe(&self.space),
            user_memory: &memory,
            custom_instructions: &custom,
        })
    }

    /// Close the session: compress the transcript into long-term memory,
    /// persist the final emotional state, discard the conversation.
    pub async fn end(self) -> SessionClose {
        let memory_saved = if self.transcript.is_empty() {
            false
        } else {
            let chat_text = self.transcript.render(self.ctx.config.exclude_tool_outputs);
            let saved = self
                .compressor
                .summarize(
                    self.ctx.summarizer.as_ref(),
                    &self.ctx.profile,
                    &self.user_id,
                    &chat_text,
                )
                .await;
            if self.ctx.config.central_memory {
                self.compressor
                    .update_central(self.ctx.summarizer.as_ref(), &self.ctx.profile, &chat_text)
                    .await;
            }
            saved
        };

        let emotions_saved = self
            .ctx
            .profile
            .persist_emotions_best_effort(&self.user_id, &self.emotions, &self.drift_state)
            .await;

        SessionClose {
            memory_saved,
            emotions_saved,
        }
    }
}

fn speak_tool() -> Tool {
    Tool {
        name: SPEAK_TOOL.to_string(),
        description: "Send a message to your conversation partner. Use this when you want \
            to say something."
            .to_string(),
        input_schema: ToolInputSchema {
            schema_type: "object".to_string(),
            properties: serde_json::json!({
                "message": { "type": "string", "description": "What to say." }
            }),
            required: vec!["message".to_string()],
        },
    }
}

/// Normalize whitespace and split into short message chunks — one per
/// line — for natural texting cadence.
fn format_reply(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}
