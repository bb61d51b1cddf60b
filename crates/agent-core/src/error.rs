//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable or not configured
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments rejected before execution
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Remote tool service failed (listing or running tools)
    #[error("Toolkit error: {0}")]
    Toolkit(String),

    /// Reasoning loop did not converge
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Session store failure
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited by the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Toolkit(_) | Self::Io(_)
        )
    }

    /// Convert to a message safe to show an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::Toolkit(_) => "The tool service is unreachable. Please try again.".into(),
            Self::MaxIterations(_) => {
                "The request took too long to process. Please try a simpler query.".into()
            }
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your API keys.".into(),
            Self::Config(msg) => format!("Configuration problem: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::RateLimited("slow down".into()).is_retryable());
        assert!(AgentError::Toolkit("503".into()).is_retryable());
        assert!(!AgentError::Auth("bad key".into()).is_retryable());
        assert!(!AgentError::MaxIterations(3).is_retryable());
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AgentError::Toolkit("connection reset by peer".into());
        assert!(!err.user_message().contains("peer"));
    }
}
