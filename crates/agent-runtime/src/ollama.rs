//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, CompletionStream, FinishReason, GenerationOptions, LlmProvider, ModelInfo,
        ProviderInfo, StreamChunk,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
    models::ModelOptions,
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    pub port: u16,

    /// Model used when the caller does not name one
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("OLLAMA_HOST").unwrap_or(defaults.host),
            port: std::env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    pub fn localhost() -> Self {
        Self::from_config(OllamaConfig::default())
    }

    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Convert agent messages to Ollama format.
    /// Tool results have no Ollama role and are sent as user context.
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User | Role::Tool => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    fn build_request(&self, messages: &[Message], opts: &GenerationOptions) -> (String, ChatMessageRequest) {
        // Hosted model names mean nothing to a local server
        let model = if opts.model.starts_with("claude") || opts.model.is_empty() {
            self.config.model.clone()
        } else {
            opts.model.clone()
        };

        let options = ModelOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX));

        let request = ChatMessageRequest::new(model.clone(), Self::convert_messages(messages))
            .options(options);
        (model, request)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            version: None,
            models,
            supports_streaming: true,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let (model, request) = self.build_request(messages, options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        Ok(Completion {
            content: response.message.content,
            model,
            usage: None,
            truncated: false,
            finish_reason: Some(FinishReason::Stop),
        })
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let (_, request) = self.build_request(messages, options);

        let stream = self
            .client
            .send_chat_messages_stream(request)
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let mapped = stream.map(|result| {
            result
                .map(|chunk| StreamChunk {
                    delta: chunk.message.content,
                    done: chunk.done,
                    usage: None,
                })
                .map_err(|_| AgentError::Provider("Ollama stream interrupted".into()))
        });

        Ok(Box::pin(mapped))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                context_length: None,
                supports_vision: false,
            })
            .collect())
    }
}
