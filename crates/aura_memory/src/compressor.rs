//! Memory compression: fold an unbounded transcript into the bounded
//! per-user memory record.
//!
//! The model is asked for a complete rewritten memory — reconciling new
//! information with old, resolving contradictions, dropping stale detail —
//! not a diff. The write is a single record replacement. A failed
//! summarization never blocks the session: the contract is a `bool`,
//! with the cause logged.

use crate::profile::ProfileStore;
use aura_core::config::MergeMode;
use aura_core::llm::{CompletionClient, GenerationParams};
use aura_core::prompt::{MemoryPromptParams, PromptSet};

pub struct MemoryCompressor {
    prompts: PromptSet,
    params: GenerationParams,
    merge: MergeMode,
}

impl MemoryCompressor {
    pub fn new(prompts: PromptSet, params: GenerationParams, merge: MergeMode) -> Self {
        Self {
            prompts,
            params,
            merge,
        }
    }

    /// Rewrite one user's memory from the finished conversation.
    /// Returns `false` (never raises past this boundary) on any
    /// completion-service or persistence error.
    pub async fn summarize(
        &self,
        client: &dyn CompletionClient,
        profile: &ProfileStore,
        user_id: &str,
        chat_text: &str,
    ) -> bool {
        match self.rewrite_user(client, profile, user_id, chat_text).await {
            Ok(()) => {
                tracing::info!(user_id, "memory updated");
                true
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "memory update failed");
                false
            }
        }
    }

    async fn rewrite_user(
        &self,
        client: &dyn CompletionClient,
        profile: &ProfileStore,
        user_id: &str,
        chat_text: &str,
    ) -> anyhow::Result<()> {
        let current = profile.user_memory(user_id).await?;
        let prompt = self.prompts.render_memory(&MemoryPromptParams {
            current_memory: &current,
            chat_text,
        });
        let rewritten = client.complete_text(&prompt, &self.params).await?;
        let merged = apply_merge(&self.merge, &current, rewritten.trim());
        profile.set_user_memory(user_id, &merged).await?;
        Ok(())
    }

    /// Same mechanism for the globally shared self-model record.
    pub async fn update_central(
        &self,
        client: &dyn CompletionClient,
        profile: &ProfileStore,
        chat_text: &str,
    ) -> bool {
        match self.rewrite_central(client, profile, chat_text).await {
            Ok(()) => {
                tracing::info!("central memory updated");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "central memory update failed");
                false
            }
        }
    }

    async fn rewrite_central(
        &self,
        client: &dyn CompletionClient,
        profile: &ProfileStore,
        chat_text: &str,
    ) -> anyhow::Result<()> {
        let current = profile.central_memory().await?;
        let prompt = self.prompts.render_central_memory(&MemoryPromptParams {
            current_memory: &current,
            chat_text,
        });
        let rewritten = client.complete_text(&prompt, &self.params).await?;
        let merged = apply_merge(&self.merge, &current, rewritten.trim());
        profile.set_central_memory(&merged).await?;
        Ok(())
    }
}

/// Fold the rewrite into the stored value per the configured policy.
fn apply_merge(mode: &MergeMode, old: &str, new: &str) -> String {
    match mode {
        MergeMode::Replace => new.to_string(),
        MergeMode::Append {
            separator,
            max_chars,
        } => {
            let combined = format!("{}{}{}", old, separator, new);
            truncate_front(&combined, *max_chars)
        }
    }
}

/// Keep the newest `max_chars` characters — recent understanding wins
/// when the append log outgrows its bound.
fn truncate_front(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    text.chars().skip(total - max_chars).collect()
}
