//! Conversation Messages
//!
//! Standard message format used across the agent system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result (injected as context)
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: String,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Tool call ID (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool result message
    pub fn tool(content: impl Into<String>, tool_call_id: Option<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = tool_call_id;
        msg
    }

    /// Estimate token count (rough approximation)
    #[allow(clippy::cast_possible_truncation)]
    pub fn estimate_tokens(&self) -> u32 {
        // ~4 characters per token, +4 for role overhead
        (self.content.len() / 4) as u32 + 4
    }
}

/// Conversation history with utility methods
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,

    /// Maximum context length (in estimated tokens)
    #[serde(default = "default_max_context")]
    max_context_tokens: u32,
}

const fn default_max_context() -> u32 {
    32_000
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            max_context_tokens: default_max_context(),
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(prompt));
        conv
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent assistant reply
    pub fn last_assistant(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Clear all messages except system prompt
    pub fn clear_history(&mut self) {
        self.messages.retain(|m| m.role == Role::System);
    }

    pub fn estimate_tokens(&self) -> u32 {
        self.messages.iter().map(Message::estimate_tokens).sum()
    }

    /// Drop the oldest non-system messages until the estimate fits.
    /// The newest message is always kept.
    pub fn truncate_to_fit(&mut self) {
        while self.estimate_tokens() > self.max_context_tokens && self.messages.len() > 2 {
            match self.messages.iter().position(|m| m.role != Role::System) {
                Some(pos) if pos < self.messages.len() - 1 => {
                    self.messages.remove(pos);
                }
                _ => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
