//! Typed prompt templates.
//!
//! A template declares exactly the placeholders it requires and is
//! validated at construction — a missing `{placeholder}` is rejected when
//! the template is built, not discovered at render time mid-conversation.
//! Rendering is a pure substitution over the declared keys.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template is missing required placeholder {{{0}}}")]
    MissingPlaceholder(String),
}

/// Template text plus the placeholder set it must contain.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    required: Vec<String>,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>, required: &[&str]) -> Result<Self, TemplateError> {
        let text = text.into();
        for key in required {
            if !text.contains(&format!("{{{}}}", key)) {
                return Err(TemplateError::MissingPlaceholder(key.to_string()));
            }
        }
        Ok(Self {
            text,
            required: required.iter().map(|k| k.to_string()).collect(),
        })
    }

    /// Substitute the declared placeholders. Unknown keys in `params` are
    /// ignored; undeclared `{...}` sequences in the text pass through
    /// untouched.
    pub fn render(&self, params: &[(&str, &str)]) -> String {
        let mut out = self.text.clone();
        for (key, value) in params {
            if self.required.iter().any(|k| k == key) {
                out = out.replace(&format!("{{{}}}", key), value);
            }
        }
        out
    }
}

// ============================================================================
// Typed render parameters
// ============================================================================

/// Everything the persona system prompt embeds.
#[derive(Debug)]
pub struct SystemPromptParams<'a> {
    pub persona: &'a str,
    pub emotional_state: &'a str,
    pub user_memory: &'a str,
    pub custom_instructions: &'a str,
}

/// Everything the emotion-scoring prompt embeds.
#[derive(Debug)]
pub struct ScoringPromptParams<'a> {
    pub conversation: &'a str,
    pub current_state: &'a str,
    pub dimension_list: &'a str,
    pub sensitivity: u8,
}

/// Everything the memory-rewrite prompt embeds.
#[derive(Debug)]
pub struct MemoryPromptParams<'a> {
    pub current_memory: &'a str,
    pub chat_text: &'a str,
}

// ============================================================================
// PromptSet
// ============================================================================

/// The three templates the core pipeline renders. Wording is
/// configuration; these are the shipped defaults.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub system: PromptTemplate,
    pub scoring: PromptTemplate,
    pub memory: PromptTemplate,
    pub central_memory: PromptTemplate,
}

/// Raw template overrides as read from config. Any field left out keeps
/// the shipped default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub system: Option<String>,
    pub scoring: Option<String>,
    pub memory: Option<String>,
    pub central_memory: Option<String>,
}

const SYSTEM_KEYS: &[&str] = &[
    "persona",
    "emotional_state",
    "user_memory",
    "custom_instructions",
];
const SCORING_KEYS: &[&str] = &[
    "conversation",
    "current_state",
    "dimension_list",
    "sensitivity",
];
const MEMORY_KEYS: &[&str] = &["current_memory", "chat_text"];

const DEFAULT_SYSTEM: &str = "\
{persona}

Current Emotional State:
{emotional_state}

Here is what you know about your conversation partner:
{user_memory}

Additional instructions from your partner:
{custom_instructions}

Messaging style: text like a real person would. When you have multiple
thoughts, break them into separate lines — each line is sent as its own
short message. Keep the whole response concise. Do not tell your partner
your emotional state directly.";

const DEFAULT_SCORING: &str = "\
You are the limbic system of a conversational agent.
Based on the conversation below, decide how the emotional state should drift.

Conversation:
{conversation}

Current emotional state, as comma-separated integers for: {dimension_list}
{current_state}

Output ONLY the drift as a comma-separated list of signed integers, one per
dimension ({dimension_list}), in that order. Keep each value within
[-{sensitivity}, +{sensitivity}].

Example output:
15,-5,0,8";

const DEFAULT_MEMORY: &str = "\
You've just finished another conversation with this person. Each
interaction reveals more about who they are.

Here is your current understanding of this person:

{current_memory}

Here is the full conversation you just had:

{chat_text}

Reflect on what you learned: new facts, feelings, preferences,
contradictions with what you already knew, shifts in mood, goals or
relationships worth noting.

Respond with ONLY your fully updated understanding of this person,
rewritten from scratch to include every new insight and correction.";

const DEFAULT_CENTRAL_MEMORY: &str = "\
You've just finished another conversation. Below is your current model of
yourself — who you are, how you tend to react, what you care about.

{current_memory}

Here is the conversation you just had:

{chat_text}

Respond with ONLY your updated self-model, rewritten to fold in anything
this conversation revealed about you.";

impl PromptSet {
    /// Build the prompt set, applying any config overrides. Every template
    /// (default or override) is validated for its required placeholders.
    pub fn build(overrides: &PromptOverrides) -> Result<Self, TemplateError> {
        Ok(Self {
            system: PromptTemplate::new(
                overrides.system.as_deref().unwrap_or(DEFAULT_SYSTEM),
                SYSTEM_KEYS,
            )?,
            scoring: PromptTemplate::new(
                overrides.scoring.as_deref().unwrap_or(DEFAULT_SCORING),
                SCORING_KEYS,
            )?,
            memory: PromptTemplate::new(
                overrides.memory.as_deref().unwrap_or(DEFAULT_MEMORY),
                MEMORY_KEYS,
            )?,
            central_memory: PromptTemplate::new(
                overrides
                    .central_memory
                    .as_deref()
                    .unwrap_or(DEFAULT_CENTRAL_MEMORY),
                MEMORY_KEYS,
            )?,
        })
    }

    pub fn render_system(&self, p: &SystemPromptParams) -> String {
        self.system.render(&[
            ("persona", p.persona),
            ("emotional_state", p.emotional_state),
            ("user_memory", p.user_memory),
            ("custom_instructions", p.custom_instructions),
        ])
    }

    pub fn render_scoring(&self, p: &ScoringPromptParams) -> String {
        let sensitivity = p.sensitivity.to_string();
        self.scoring.render(&[
            ("conversation", p.conversation),
            ("current_state", p.current_state),
            ("dimension_list", p.dimension_list),
            ("sensitivity", &sensitivity),
        ])
    }

    pub fn render_memory(&self, p: &MemoryPromptParams) -> String {
        self.memory.render(&[
            ("current_memory", p.current_memory),
            ("chat_text", p.chat_text),
        ])
    }

    pub fn render_central_memory(&self, p: &MemoryPromptParams) -> String {
        self.central_memory.render(&[
            ("current_memory", p.current_memory),
            ("chat_text", p.chat_text),
        ])
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        // Shipped defaults always carry their placeholders.
        Self::build(&PromptOverrides::default()).expect("default templates are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_placeholder_rejected_at_construction() {
        let err = PromptTemplate::new("no placeholders here", &["conversation"]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingPlaceholder("conversation".to_string())
        );
    }

    #[test]
    fn test_render_substitutes_declared_keys() {
        let t = PromptTemplate::new("hello {name}, you are {mood}", &["name", "mood"]).unwrap();
        let out = t.render(&[("name", "sam"), ("mood", "calm"), ("extra", "ignored")]);
        assert_eq!(out, "hello sam, you are calm");
    }

    #[test]
    fn test_undeclared_braces_pass_through() {
        let t = PromptTemplate::new("say {word} verbatim: {not_a_key}", &["word"]).unwrap();
        let out = t.render(&[("word", "hi")]);
        assert_eq!(out, "say hi verbatim: {not_a_key}");
    }

    #[test]
    fn test_default_set_builds() {
        let set = PromptSet::default();
        let sys = set.render_system(&SystemPromptParams {
            persona: "You are Aura.",
            emotional_state: "Sadness_Joy: 10",
            user_memory: "Likes tea.",
            custom_instructions: "N/A",
        });
        assert!(sys.contains("You are Aura."));
        assert!(sys.contains("Sadness_Joy: 10"));
        assert!(sys.contains("Likes tea."));
    }

    #[test]
    fn test_bad_override_rejected() {
        let overrides = PromptOverrides {
            scoring: Some("no keys at all".to_string()),
            ..Default::default()
        };
        assert!(PromptSet::build(&overrides).is_err());
    }

    #[test]
    fn test_scoring_render_embeds_sensitivity() {
        let set = PromptSet::default();
        let out = set.render_scoring(&ScoringPromptParams {
            conversation: "User: hey",
            current_state: "0,0,0,0",
            dimension_list: "A, B, C, D",
            sensitivity: 30,
        });
        assert!(out.contains("[-30, +30]"));
        assert!(out.contains("User: hey"));
    }
}
