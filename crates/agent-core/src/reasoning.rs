//! Reasoning Loop
//!
//! The agent asks the model, executes any tool call the reply contains, feeds
//! the result back and repeats until the model answers in plain text.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt
    pub system_prompt: String,

    /// Maximum reasoning iterations before giving up
    pub max_iterations: usize,

    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,

    /// Extra attempts after a retryable provider error
    pub max_retries: u32,

    /// Delay before the first retry, doubled on each further attempt
    pub retry_backoff: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 8,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so.
Be concise and accurate."#;

/// Final reply plus every tool result produced on the way there
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    pub reply: String,
    pub tool_results: Vec<ToolResult>,
}

impl RunOutcome {
    /// Whether a call to `tool` ran and succeeded
    pub fn tool_succeeded(&self, tool: &str) -> bool {
        self.tool_results
            .iter()
            .any(|r| r.success && r.name.contains(tool))
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Build the full system prompt including tool descriptions
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run the agent on a conversation and return the final reply
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        self.run_traced(conversation).await.map(|o| o.reply)
    }

    /// Run the agent, keeping every tool result for the caller
    pub async fn run_traced(&self, conversation: &mut Conversation) -> Result<RunOutcome> {
        if conversation.messages().first().map(|m| &m.role) != Some(&Role::System) {
            conversation
                .messages_mut()
                .insert(0, Message::system(self.build_system_prompt()));
        }

        let mut outcome = RunOutcome::default();

        for iteration in 1..=self.config.max_iterations {
            conversation.truncate_to_fit();

            let completion = self.complete(conversation).await?;

            let content = completion.content;
            conversation.push(Message::assistant(&content));

            let Some(tool_call) = parse_tool_call(&content) else {
                outcome.reply = content;
                return Ok(outcome);
            };

            tracing::debug!(tool = %tool_call.name, iteration, "Executing tool");
            let result = self.execute_tool(&tool_call).await;

            conversation.push(Message::tool(format_tool_result(&result), tool_call.id.clone()));
            outcome.tool_results.push(result);
        }

        Err(AgentError::MaxIterations(self.config.max_iterations))
    }

    /// One completion, retried with backoff while the error is retryable
    async fn complete(&self, conversation: &Conversation) -> Result<Completion> {
        let mut attempt = 0;
        loop {
            match self
                .provider
                .complete(conversation.messages(), &self.config.generation)
                .await
            {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_backoff * 2u32.pow(attempt);
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, ?delay, "Retrying completion");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Run with a single question in a fresh conversation
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt());
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                result
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult {
                    name: call.name.clone(),
                    id: call.id.clone(),
                    success: false,
                    output: format!("Error: {e}"),
                    data: None,
                }
            }
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Parse a tool call from an LLM response.
///
/// Looks for a fenced ```` ```tool ```` block first, then for a bare JSON
/// object carrying a `"tool"` key.
pub fn parse_tool_call(content: &str) -> Option<ToolCall> {
    const TOOL_START: &str = "```tool";
    const TOOL_END: &str = "```";

    if let Some(start_idx) = content.find(TOOL_START) {
        let after_marker = &content[start_idx + TOOL_START.len()..];
        if let Some(end_idx) = after_marker.find(TOOL_END) {
            let json_str = after_marker[..end_idx].trim();

            if let Ok(mut call) = serde_json::from_str::<ToolCall>(json_str) {
                if call.id.is_none() {
                    call.id = Some(uuid::Uuid::new_v4().to_string());
                }
                return Some(call);
            }
        }
    }

    parse_inline_tool_call(content)
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;

    if end <= start {
        return None;
    }

    let mut call = serde_json::from_str::<ToolCall>(&content[start..=end]).ok()?;
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    Some(call)
}

fn format_tool_result(result: &ToolResult) -> String {
    if result.success {
        format!("[Tool '{}' returned]\n{}", result.name, result.output)
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, result.output)
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.config.max_retries = max_retries;
        self.config.retry_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use crate::tool::DateTimeTool;

    #[test]
    fn test_parse_fenced_tool_call() {
        let content = r#"Let me check that for you.
```tool
{"tool": "datetime", "arguments": {"format": "iso"}}
```"#;
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "datetime");
        assert_eq!(call.str_arg("format"), Some("iso"));
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let call = parse_tool_call(r#"Sure: {"tool": "datetime", "arguments": {}}"#).unwrap();
        assert_eq!(call.name, "datetime");
    }

    #[test]
    fn test_plain_text_is_not_a_tool_call() {
        assert!(parse_tool_call("| Post Title | Suggested Response |").is_none());
    }

    #[tokio::test]
    async fn test_run_executes_tool_then_answers() {
        let provider = Arc::new(ScriptedProvider::new([
            r#"```tool
{"tool": "datetime", "arguments": {"format": "unix"}}
```"#,
            "It is late.",
        ]));
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .tool(DateTimeTool)
            .build()
            .unwrap();

        let mut conversation = Conversation::new();
        conversation.push(Message::user("What time is it?"));
        let outcome = agent.run_traced(&mut conversation).await.unwrap();

        assert_eq!(outcome.reply, "It is late.");
        assert!(outcome.tool_succeeded("datetime"));
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert!(conversation.messages().iter().any(|m| m.role == Role::Tool));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_after_max_iterations() {
        let looping = r#"{"tool": "datetime", "arguments": {}}"#;
        let provider = Arc::new(ScriptedProvider::new([looping, looping, looping]));
        let agent = AgentBuilder::new()
            .provider(provider)
            .tool(DateTimeTool)
            .max_iterations(2)
            .build()
            .unwrap();

        let err = agent.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(2)));
    }

    #[tokio::test]
    async fn test_run_retries_rate_limited_completion() {
        let provider = Arc::new(
            ScriptedProvider::new(["Back again."]).with_failures([
                AgentError::RateLimited("slow down".into()),
                AgentError::RateLimited("slow down".into()),
            ]),
        );
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .retries(2, Duration::ZERO)
            .build()
            .unwrap();

        assert_eq!(agent.ask("hello").await.unwrap(), "Back again.");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_retries() {
        let provider = Arc::new(
            ScriptedProvider::new(["never reached"]).with_failures([
                AgentError::ProviderUnavailable("down".into()),
                AgentError::ProviderUnavailable("still down".into()),
                AgentError::ProviderUnavailable("down for good".into()),
            ]),
        );
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .retries(1, Duration::ZERO)
            .build()
            .unwrap();

        let err = agent.ask("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_auth_errors() {
        let provider = Arc::new(
            ScriptedProvider::new(["never reached"]).with_failures([AgentError::Auth("bad key".into())]),
        );
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .retries(3, Duration::ZERO)
            .build()
            .unwrap();

        assert!(matches!(agent.ask("hello").await, Err(AgentError::Auth(_))));
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
