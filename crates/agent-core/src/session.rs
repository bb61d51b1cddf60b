//! Session Management
//!
//! Chat sessions with conversation history. Stores hand out clones; callers
//! mutate their copy and `save` it back at the end of a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Role};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    pub conversation: Conversation,

    /// Model used for this session
    pub model: Option<String>,

    pub title: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            model: None,
            title: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_system_prompt(system_prompt: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.conversation = Conversation::with_system_prompt(system_prompt);
        session
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Explicit title, or a preview of the first user message
    pub fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.conversation
                .messages()
                .iter()
                .find(|m| m.role == Role::User)
                .map_or_else(
                    || format!("Session {}", self.id.0.chars().take(8).collect::<String>()),
                    |m| {
                        let preview: String = m.content.chars().take(50).collect();
                        if m.content.chars().count() > 50 {
                            format!("{preview}...")
                        } else {
                            preview
                        }
                    },
                )
        })
    }

    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session store trait for persistence
pub trait SessionStore: Send + Sync {
    fn save(&self, session: &Session) -> Result<()>;

    fn load(&self, id: &SessionId) -> Result<Option<Session>>;

    fn delete(&self, id: &SessionId) -> Result<()>;

    /// Most recently updated sessions first
    fn list(&self, limit: usize) -> Result<Vec<Session>>;
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("session store lock poisoned".into())
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.read().map_err(poisoned)?.get(id).cloned())
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        self.sessions.write().map_err(poisoned)?.remove(id);
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<Session>> {
        let mut result: Vec<_> = self.sessions.read().map_err(poisoned)?.values().cloned().collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result.truncate(limit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn test_session_creation() {
        let session = Session::new();
        assert_eq!(session.message_count(), 0);
        assert!(session.title().starts_with("Session "));
    }

    #[test]
    fn test_title_from_first_user_message() {
        let mut session = Session::with_system_prompt("sys");
        session.conversation.push(Message::user("x".repeat(60)));
        assert_eq!(session.title(), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        let session = Session::new();
        let id = session.id.clone();

        store.save(&session).unwrap();
        assert_eq!(store.load(&id).unwrap().map(|s| s.id), Some(id.clone()));
        assert_eq!(store.list(10).unwrap().len(), 1);

        store.delete(&id).unwrap();
        assert!(store.load(&id).unwrap().is_none());
    }
}
