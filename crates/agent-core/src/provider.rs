//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for hosted and local chat-completion backends
//! so the agent works with any of them without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = AnthropicProvider::from_env()?;
//! let completion = provider.complete(&messages, &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;
use crate::message::Message;

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "claude-3-7-sonnet-20250219", "llama3.2")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    2048
}
const fn default_top_p() -> f32 {
    0.9
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stop_sequences: Vec::new(),
        }
    }
}

impl GenerationOptions {
    /// Defaults with a specific model
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    pub usage: Option<TokenUsage>,

    /// Whether the response hit the token limit
    pub truncated: bool,

    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Plain text completion with no usage data
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            truncated: false,
            finish_reason: Some(FinishReason::Stop),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// A chunk from streaming completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamChunk {
    /// The text delta
    pub delta: String,

    /// Whether this is the final chunk
    pub done: bool,

    /// Token usage (typically only on final chunk)
    pub usage: Option<TokenUsage>,
}

/// Stream type for completion streaming
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "Anthropic", "Ollama")
    pub name: String,

    pub version: Option<String>,

    pub models: Vec<ModelInfo>,

    pub supports_streaming: bool,

    /// Whether native tool/function calling is supported
    pub supports_tools: bool,
}

/// Information about a model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context_length: Option<u32>,
    pub supports_vision: bool,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information and capabilities
    async fn info(&self) -> Result<ProviderInfo>;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(&self, messages: &[Message], options: &GenerationOptions)
    -> Result<Completion>;

    /// Generate a streaming completion
    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Estimate token count for text (provider-specific tokenization)
    #[allow(clippy::cast_possible_truncation)]
    fn estimate_tokens(&self, text: &str) -> u32 {
        // Default: rough estimate of ~4 chars per token
        (text.len() / 4) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: GenerationOptions = serde_json::from_str(r#"{"model": "llama3.2"}"#).unwrap();
        assert_eq!(opts.model, "llama3.2");
        assert_eq!(opts.max_tokens, 2048);
        assert!(opts.stop_sequences.is_empty());
    }
}
