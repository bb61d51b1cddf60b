//! Test doubles shared by downstream crates (`testing` feature).

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{AgentError, Result};
use crate::mail::SEND_EMAIL_TOOL;
use crate::message::Message;
use crate::provider::{
    Completion, CompletionStream, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
    StreamChunk,
};
use crate::tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};

/// Provider that replays canned replies in order and records every prompt
pub struct ScriptedProvider {
    failures: Mutex<VecDeque<AgentError>>,
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Vec<Message>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failures: Mutex::new(VecDeque::new()),
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next requests with `errors`, in order, before any reply is served
    #[must_use]
    pub fn with_failures(self, errors: impl IntoIterator<Item = AgentError>) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.extend(errors);
        }
        self
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages sent on each completion request
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_reply(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(messages.to_vec());
        }
        if let Some(err) = self.failures.lock().ok().and_then(|mut f| f.pop_front()) {
            return Err(err);
        }
        self.replies
            .lock()
            .map_err(|_| AgentError::Provider("script lock poisoned".into()))?
            .pop_front()
            .ok_or_else(|| AgentError::Provider("script exhausted".into()))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            version: None,
            models: self.list_models().await?,
            supports_streaming: true,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let reply = self.next_reply(messages)?;
        Ok(Completion::text(reply, options.model.clone()))
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        _options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let reply = self.next_reply(messages)?;
        let chunk = StreamChunk {
            delta: reply,
            done: true,
            usage: None,
        };
        Ok(Box::pin(futures::stream::iter([Ok(chunk)])))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            name: "scripted".into(),
            context_length: None,
            supports_vision: false,
        }])
    }
}

/// `send_email` stand-in that always succeeds
pub struct EmailTool;

#[async_trait]
impl Tool for EmailTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: SEND_EMAIL_TOOL.into(),
            description: "Send an email".into(),
            parameters: vec![ParameterSchema::new("to", "string", "Recipient", true)],
            category: None,
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success(
            SEND_EMAIL_TOOL,
            format!("sent to {}", call.str_arg("to").unwrap_or("?")),
        ))
    }
}
