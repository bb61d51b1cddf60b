//! Error Types for Reddit Engagement

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngageError>;

#[derive(Error, Debug)]
pub enum EngageError {
    #[error("Reddit request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Reddit returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected Reddit response: {0}")]
    InvalidResponse(String),

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Engagement session not found: {0}")]
    ContextNotFound(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Nothing to do: {0}")]
    Empty(String),

    #[error("Agent error: {0}")]
    Agent(#[from] agent_core::AgentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngageError {
    /// Whether the failure came from a missing resource rather than a fault
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::PostNotFound(_) | Self::ContextNotFound(_))
    }

    /// Whether the caller sent something unusable
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelection(_) | Self::InvalidRecipient(_) | Self::Empty(_)
        )
    }
}

impl From<EngageError> for agent_core::AgentError {
    fn from(err: EngageError) -> Self {
        match err {
            EngageError::Agent(inner) => inner,
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(EngageError::ContextNotFound("x".into()).is_not_found());
        assert!(EngageError::InvalidSelection("9".into()).is_client_error());
        assert!(!EngageError::InvalidResponse("bad".into()).is_not_found());
    }

    #[test]
    fn test_agent_error_round_trip() {
        let err: agent_core::AgentError =
            EngageError::Agent(agent_core::AgentError::MaxIterations(3)).into();
        assert!(matches!(err, agent_core::AgentError::MaxIterations(3)));

        let err: agent_core::AgentError = EngageError::PostNotFound("u".into()).into();
        assert!(matches!(err, agent_core::AgentError::ToolExecution(_)));
    }
}
