//! Error Types for the Research Agents

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResearchError>;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Agent error: {0}")]
    Agent(#[from] agent_core::AgentError),
}

impl ResearchError {
    /// Whether the caller sent something unusable
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidRecipient(_))
    }
}

/// Trimmed `value`, or an error naming `field` when nothing is left
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ResearchError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}
