//! # agent-runtime
//!
//! Concrete backends for the agent workspace.
//!
//! ## Providers
//!
//! - **Anthropic**: hosted Messages API over `reqwest`
//! - **Ollama** (default feature): local inference via `ollama-rs`
//!
//! ## Remote tools
//!
//! - **Toolhouse**: hosted tool service exposed through `RemoteToolkit`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::RuntimeConfig;
//!
//! let runtime = RuntimeConfig::from_env()?;
//! let provider = runtime.build_provider()?;
//! let mut tools = ToolRegistry::new();
//! runtime.register_remote_tools(&mut tools).await;
//! ```

pub mod anthropic;
pub mod config;
pub mod toolhouse;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use config::{ProviderKind, RuntimeConfig};
pub use toolhouse::{ToolhouseClient, ToolhouseConfig};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Session, Tool, ToolRegistry,
};
