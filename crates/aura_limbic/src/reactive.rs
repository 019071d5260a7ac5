//! Reactive emotion updates: the conversation itself moves the needle.
//!
//! The scorer model is shown the current vector and the recent exchange
//! and asked for one signed integer delta per dimension. A failed update
//! — transport error, malformed reply, wrong arity — is an ordinary value
//! the caller handles by keeping the prior vector; it is never fatal to
//! the conversation turn, and a malformed reply is never partially applied.

use aura_core::emotion::{EmotionParseError, EmotionSpace, EmotionVector};
use aura_core::llm::{CompletionClient, GenerationParams};
use aura_core::prompt::{PromptSet, ScoringPromptParams};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("completion request failed: {0}")]
    Completion(String),
    #[error("malformed emotion delta: {0}")]
    Malformed(#[from] EmotionParseError),
}

pub struct ReactiveUpdater {
    prompts: PromptSet,
    params: GenerationParams,
}

impl ReactiveUpdater {
    pub fn new(prompts: PromptSet, params: GenerationParams) -> Self {
        Self { prompts, params }
    }

    /// Score the conversation and return the updated vector.
    ///
    /// Deltas are individually clamped to `[-sensitivity, +sensitivity]`
    /// before application; the result is then re-clamped to the active
    /// regime. On any failure the caller keeps `current` unchanged.
    pub async fn update(
        &self,
        client: &dyn CompletionClient,
        current: &EmotionVector,
        space: &EmotionSpace,
        transcript_text: &str,
        sensitivity: u8,
    ) -> Result<EmotionVector, UpdateError> {
        let prompt = self.prompts.render_scoring(&ScoringPromptParams {
            conversation: transcript_text,
            current_state: &current.format(),
            dimension_list: &space.dimension_list(),
            sensitivity,
        });

        let text = client
            .complete_text(&prompt, &self.params)
            .await
            .map_err(|e| UpdateError::Completion(e.to_string()))?;

        let mut deltas = EmotionVector::parse_deltas(&text, space)?;
        let cap = sensitivity.min(100) as i32;
        for d in deltas.iter_mut() {
            *d = (*d).clamp(-cap, cap);
        }

        let updated = current.apply_deltas(&deltas, space);
        tracing::debug!(deltas = %text.trim(), state = %updated.format(), "reactive emotion update");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::llm::{CompletionResponse, ContentBlock, Message, Tool};

    /// Scorer double that always answers with a fixed text.
    struct TextClient(&'static str);

    #[async_trait::async_trait]
    impl CompletionClient for TextClient {
        async fn complete(
            &self,
            _system: Option<&str>,
            _messages: Vec<Message>,
            _tools: Vec<Tool>,
            _params: &GenerationParams,
        ) -> anyhow::Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: vec![ContentBlock::Text {
                    text: self.0.to_string(),
                }],
            })
        }
    }

    /// Scorer double simulating an unreachable service.
    struct FailClient;

    #[async_trait::async_trait]
    impl CompletionClient for FailClient {
        async fn complete(
            &self,
            _system: Option<&str>,
            _messages: Vec<Message>,
            _tools: Vec<Tool>,
            _params: &GenerationParams,
        ) -> anyhow::Result<CompletionResponse> {
            anyhow::bail!("connection refused")
        }
    }

    fn updater() -> ReactiveUpdater {
        ReactiveUpdater::new(PromptSet::default(), GenerationParams::default())
    }

    fn space() -> EmotionSpace {
        EmotionSpace::bipolar()
    }

    #[tokio::test]
    async fn test_update_applies_deltas() {
        let space = space();
        let current = space.initial_vector();
        let out = updater()
            .update(&TextClient("20,-5,0,10"), &current, &space, "User: hey!", 30)
            .await
            .unwrap();
        assert_eq!(out.values(), &[20, -5, 0, 10]);
    }

    #[tokio::test]
    async fn test_deltas_clamped_to_sensitivity() {
        let space = space();
        let current = space.initial_vector();
        let out = updater()
            .update(&TextClient("90,-90,5,0"), &current, &space, "User: !!", 30)
            .await
            .unwrap();
        assert_eq!(out.values(), &[30, -30, 5, 0]);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_error_and_input_untouched() {
        let space = space();
        let current = EmotionVector::from_values(vec![1, 2, 3, 4], &space).unwrap();
        let before = current.clone();
        let err = updater()
            .update(&TextClient("happy!"), &current, &space, "User: hi", 30)
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Malformed(_)));
        assert_eq!(current, before);
    }

    #[tokio::test]
    async fn test_arity_mismatch_is_error() {
        let space = space();
        let current = space.initial_vector();
        let err = updater()
            .update(&TextClient("1,2,3"), &current, &space, "User: hi", 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UpdateError::Malformed(EmotionParseError::Arity { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        let space = space();
        let current = space.initial_vector();
        let err = updater()
            .update(&FailClient, &current, &space, "User: hi", 30)
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Completion(_)));
    }

    #[tokio::test]
    async fn test_simplex_update_keeps_budget() {
        let space = EmotionSpace::simplex();
        let current = space.initial_vector(); // 50,10,10,5,5,20
        let out = updater()
            .update(
                &TextClient("30,-10,-10,0,0,-10"),
                &current,
                &space,
                "User: great news!",
                40,
            )
            .await
            .unwrap();
        assert_eq!(out.values().iter().sum::<i32>(), 100);
        assert!(out.values().iter().all(|&v| v >= 0));
    }
}
