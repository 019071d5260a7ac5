//! Session transcript: an ordered, append-only record of one conversation.
//!
//! Turns are only ever appended, never reordered or mutated. The session
//! owns its transcript exclusively; at session end it is flattened into
//! the memory compressor and then discarded.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
    ToolCall,
    ToolResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    agent_name: String,
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            turns: Vec::new(),
        }
    }

    pub fn push_user(&mut self, text: &str) {
        self.push(Speaker::User, text);
    }

    pub fn push_agent(&mut self, text: &str) {
        self.push(Speaker::Agent, text);
    }

    pub fn push_tool_call(&mut self, text: &str) {
        self.push(Speaker::ToolCall, text);
    }

    pub fn push_tool_result(&mut self, text: &str) {
        self.push(Speaker::ToolResult, text);
    }

    fn push(&mut self, speaker: Speaker, text: &str) {
        self.turns.push(Turn {
            speaker,
            text: text.to_string(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Flatten to a single text blob for prompting:
    ///
    /// ```text
    /// User: <msg>
    /// Aura: <reply>
    /// ```
    ///
    /// With `exclude_tool_outputs`, tool invocation/result bookkeeping is
    /// dropped so emotional scoring and memory rewriting track the human
    /// exchange, not tool mechanics.
    pub fn render(&self, exclude_tool_outputs: bool) -> String {
        let mut lines = Vec::with_capacity(self.turns.len());
        for turn in &self.turns {
            match turn.speaker {
                Speaker::User => lines.push(format!("User: {}", turn.text)),
                Speaker::Agent => lines.push(format!("{}: {}", self.agent_name, turn.text)),
                Speaker::ToolCall if !exclude_tool_outputs => {
                    lines.push(format!("[tool call] {}", turn.text))
                }
                Speaker::ToolResult if !exclude_tool_outputs => {
                    lines.push(format!("[tool result] {}", turn.text))
                }
                _ => {}
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_preserves_order() {
        let mut t = Transcript::new("Aura");
        t.push_user("hi");
        t.push_agent("hello!");
        t.push_user("how are you?");
        let text = t.render(true);
        assert_eq!(text, "User: hi\nAura: hello!\nUser: how are you?");
    }

    #[test]
    fn test_render_excludes_tool_turns() {
        let mut t = Transcript::new("Aura");
        t.push_user("what's the weather?");
        t.push_tool_call("search_web({\"query\":\"weather\"})");
        t.push_tool_result("sunny, 21C");
        t.push_agent("sunny today");

        let clean = t.render(true);
        assert!(!clean.contains("tool"));
        assert!(clean.contains("User: what's the weather?"));

        let full = t.render(false);
        assert!(full.contains("[tool call] search_web"));
        assert!(full.contains("[tool result] sunny, 21C"));
    }

    #[test]
    fn test_turns_are_append_only() {
        let mut t = Transcript::new("Aura");
        t.push_user("one");
        t.push_agent("two");
        assert_eq!(t.len(), 2);
        assert_eq!(t.turns()[0].speaker, Speaker::User);
        assert_eq!(t.turns()[1].speaker, Speaker::Agent);
    }
}
