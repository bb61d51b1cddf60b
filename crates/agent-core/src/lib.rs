//! # agent-core
//!
//! Provider-agnostic LLM abstraction, tool system and reasoning loop shared
//! by every agent in the workspace.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Agent                               │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │  Reasoning  │  │ ToolRegistry │  │   LlmProvider        │  │
//! │  │    Loop     │──│ local+remote │──│   (Strategy)         │  │
//! │  └─────────────┘  └──────────────┘  └──────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Anthropic, Ollama or any
//! other backend without changing agent logic. Remote tool services plug in
//! through `RemoteToolkit`.

pub mod error;
pub mod mail;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;
pub mod toolkit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{AgentError, Result};
pub use mail::{Delivery, Mailer};
pub use message::{Conversation, Message, Role};
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, RunOutcome};
pub use session::{MemorySessionStore, Session, SessionId, SessionStore};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
pub use toolkit::{RemoteTool, RemoteToolkit};
