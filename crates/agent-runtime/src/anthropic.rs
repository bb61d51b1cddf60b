//! Anthropic Messages API Provider
//!
//! Hosted chat completions over plain `reqwest`. Tool calls stay in the
//! agent's text protocol, so tools are described in the system prompt rather
//! than sent as native tool definitions.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, CompletionStream, DEFAULT_MODEL, FinishReason, GenerationOptions,
        LlmProvider, ModelInfo, ProviderInfo, StreamChunk, TokenUsage,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_key: String,

    /// API root, without the `/v1` suffix
    pub base_url: String,

    /// Model used when the caller does not name one
    pub model: String,

    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 120,
        }
    }

    /// Read `ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL` and `ANTHROPIC_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    http: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(AnthropicConfig::from_env()?)
    }

    pub const fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url, path)
    }

    fn model_for(&self, opts: &GenerationOptions) -> String {
        if opts.model.starts_with("claude") {
            opts.model.clone()
        } else {
            self.config.model.clone()
        }
    }

    fn build_request(&self, messages: &[Message], opts: &GenerationOptions, stream: bool) -> MessagesRequest {
        let (system, turns) = convert_messages(messages);
        MessagesRequest {
            model: self.model_for(opts),
            max_tokens: opts.max_tokens,
            system,
            messages: turns,
            temperature: opts.temperature,
            top_p: opts.top_p,
            stop_sequences: opts.stop_sequences.clone(),
            stream,
        }
    }

    async fn post(&self, body: &MessagesRequest) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.url("messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response.text().await.unwrap_or_default();
        Err(status_error(status, detail))
    }
}

fn status_error(status: StatusCode, detail: String) -> AgentError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() || s.as_u16() == 529 => AgentError::ProviderUnavailable(detail),
        s => AgentError::Provider(format!("{s}: {detail}")),
    }
}

/// Split system prompts out and fold the rest into alternating turns.
///
/// The Messages API takes the system prompt separately and rejects two
/// consecutive turns with the same role, so adjacent same-role messages
/// (e.g. an assistant tool request followed by its tool result and a user
/// follow-up) are merged.
fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<ApiMessage>) {
    let mut system_parts = Vec::new();
    let mut turns: Vec<ApiMessage> = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::System => {
                system_parts.push(message.content.as_str());
                continue;
            }
            Role::User | Role::Tool => "user",
            Role::Assistant => "assistant",
        };

        match turns.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => turns.push(ApiMessage {
                role,
                content: message.content.clone(),
            }),
        }
    }

    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
    (system, turns)
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl From<ApiUsage> for TokenUsage {
    fn from(u: ApiUsage) -> Self {
        Self {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

fn finish_reason(stop_reason: Option<&str>) -> Option<FinishReason> {
    stop_reason.map(|r| match r {
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolUse,
        "refusal" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    })
}

impl MessagesResponse {
    /// Concatenate every text block; other block types are ignored
    fn into_completion(self) -> Completion {
        let content: String = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        let finish = finish_reason(self.stop_reason.as_deref());

        Completion {
            content,
            model: self.model,
            usage: self.usage.map(Into::into),
            truncated: finish == Some(FinishReason::Length),
            finish_reason: finish,
        }
    }
}

/// Pull every complete server-sent event out of `buffer`, leaving any
/// trailing partial event in place.
fn drain_sse_events(buffer: &mut String) -> Vec<Result<StreamChunk>> {
    let mut chunks = Vec::new();

    while let Some(end) = buffer.find("\n\n") {
        let event: String = buffer.drain(..end + 2).collect();

        for line in event.lines() {
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<serde_json::Value>(data.trim()) else {
                continue;
            };

            match value["type"].as_str() {
                Some("content_block_delta") => {
                    if let Some(text) = value["delta"]["text"].as_str() {
                        chunks.push(Ok(StreamChunk {
                            delta: text.to_string(),
                            done: false,
                            usage: None,
                        }));
                    }
                }
                Some("message_stop") => chunks.push(Ok(StreamChunk {
                    delta: String::new(),
                    done: true,
                    usage: None,
                })),
                Some("error") => {
                    let message = value["error"]["message"]
                        .as_str()
                        .unwrap_or("stream error")
                        .to_string();
                    chunks.push(Err(AgentError::Provider(message)));
                }
                _ => {}
            }
        }
    }

    chunks
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Anthropic".into(),
            version: Some(API_VERSION.into()),
            models,
            supports_streaming: true,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let request = self.build_request(messages, options, false);
        tracing::debug!(model = %request.model, turns = request.messages.len(), "Sending Anthropic request");

        let response: MessagesResponse = self
            .post(&request)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid response: {e}")))?;

        Ok(response.into_completion())
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let request = self.build_request(messages, options, true);
        let bytes = self.post(&request).await?.bytes_stream();

        let events = bytes
            .scan(String::new(), |buffer, chunk| {
                let out = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes).replace("\r\n", "\n"));
                        drain_sse_events(buffer)
                    }
                    Err(e) => vec![Err(AgentError::ProviderUnavailable(e.to_string()))],
                };
                futures::future::ready(Some(out))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(events))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .http
            .get(self.url("models"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, detail));
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid models response: {e}")))?;

        Ok(models
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.display_name.unwrap_or_else(|| m.id.clone()),
                id: m.id,
                context_length: Some(200_000),
                supports_vision: true,
            })
            .collect())
    }
}
