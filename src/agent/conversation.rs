//! Conversation history with a pinned system prompt and bounded length.

use std::collections::VecDeque;

use crate::llm::{ChatMessage, Role, ToolCall};

/// Ordered dialogue state.
///
/// The system prompt is pinned and survives both trimming and [`clear`].
/// All other messages live in a deque that evicts oldest-first once the
/// total count exceeds `max_messages`.
///
/// [`clear`]: ConversationHistory::clear
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    system: Option<ChatMessage>,
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl ConversationHistory {
    pub fn new(system_prompt: Option<&str>, max_messages: usize) -> Self {
        Self {
            system: system_prompt
                .filter(|p| !p.is_empty())
                .map(ChatMessage::system),
            messages: VecDeque::new(),
            max_messages,
        }
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    /// Record the model's request to call tools, before any of them run.
    pub fn add_assistant_tool_calls(&mut self, tool_calls: Vec<ToolCall>) {
        self.push(ChatMessage::assistant_tool_calls(tool_calls));
    }

    /// Append a tool result. The id should match an earlier tool call;
    /// a mismatch is logged but still recorded.
    pub fn add_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) {
        let tool_call_id = tool_call_id.into();
        if !self.has_tool_call(&tool_call_id) {
            tracing::warn!(
                "Tool result '{}' does not match any recorded tool call",
                tool_call_id
            );
        }
        self.push(ChatMessage::tool_result(tool_call_id, name, content));
    }

    /// Copy of every message, system prompt first.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.system
            .iter()
            .chain(self.messages.iter())
            .cloned()
            .collect()
    }

    /// Most recent assistant message that has text content.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| m.content.as_deref().filter(|c| !c.is_empty()))
    }

    /// Drop everything except the system prompt.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len() + usize::from(self.system.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_system_prompt(&self) -> bool {
        self.system.is_some()
    }

    fn has_tool_call(&self, id: &str) -> bool {
        self.messages
            .iter()
            .filter_map(|m| m.tool_calls.as_ref())
            .flatten()
            .any(|call| call.id == id)
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        self.trim();
    }

    /// Evict the oldest non-system messages until within the cap.
    ///
    /// A tool-call turn and the results answering it leave together, and
    /// results at the front of the window are always dropped, so every
    /// remaining result follows the call that issued it.
    fn trim(&mut self) {
        // At least one non-system slot, even with a degenerate cap.
        let keep = self
            .max_messages
            .saturating_sub(usize::from(self.system.is_some()))
            .max(1);

        let before = self.messages.len();
        while self.messages.len() > keep {
            let Some(evicted) = self.messages.pop_front() else {
                break;
            };
            if evicted.tool_calls.is_some() {
                self.drop_leading_tool_results();
            }
        }
        self.drop_leading_tool_results();

        if self.messages.len() < before {
            tracing::debug!(
                "Trimmed conversation from {} to {} messages",
                before + usize::from(self.system.is_some()),
                self.len()
            );
        }
    }

    fn drop_leading_tool_results(&mut self) {
        while self.messages.front().map(|m| m.role) == Some(Role::Tool) {
            self.messages.pop_front();
        }
    }
}
