//! Runtime Configuration
//!
//! Picks the LLM backend and the optional remote toolkit from the environment.

use std::sync::Arc;

use agent_core::{
    AgentError, GenerationOptions, LlmProvider, Result, ToolRegistry,
    toolkit::{self, RemoteToolkit},
};

use crate::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::toolhouse::{ToolhouseClient, ToolhouseConfig};

#[cfg(feature = "ollama")]
use crate::ollama::{OllamaConfig, OllamaProvider};

/// Which chat-completion backend to use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    Ollama,
}

impl std::str::FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" | "local" => Ok(Self::Ollama),
            other => Err(AgentError::Config(format!("unknown LLM provider '{other}'"))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Everything needed to build a provider and tool registry
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub provider: ProviderKind,
    pub anthropic: Option<AnthropicConfig>,
    #[cfg(feature = "ollama")]
    pub ollama: OllamaConfig,
    pub toolkit: Option<ToolhouseConfig>,
    /// Completion budget per request
    pub max_tokens: u32,
}

impl RuntimeConfig {
    /// Read `LLM_PROVIDER` plus the provider-specific variables.
    ///
    /// Without `LLM_PROVIDER`, Anthropic is used when its key is present and
    /// Ollama otherwise.
    pub fn from_env() -> Result<Self> {
        let anthropic = AnthropicConfig::from_env().ok();

        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(name) => name.parse()?,
            Err(_) if anthropic.is_some() => ProviderKind::Anthropic,
            Err(_) => ProviderKind::Ollama,
        };

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2048);

        Ok(Self {
            provider,
            anthropic,
            #[cfg(feature = "ollama")]
            ollama: OllamaConfig::from_env(),
            toolkit: ToolhouseConfig::from_env(),
            max_tokens,
        })
    }

    /// Model name the agents should request
    pub fn model(&self) -> String {
        match self.provider {
            ProviderKind::Anthropic => self
                .anthropic
                .as_ref()
                .map_or_else(|| agent_core::provider::DEFAULT_MODEL.to_string(), |c| c.model.clone()),
            #[cfg(feature = "ollama")]
            ProviderKind::Ollama => self.ollama.model.clone(),
            #[cfg(not(feature = "ollama"))]
            ProviderKind::Ollama => String::new(),
        }
    }

    pub fn generation(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            ..GenerationOptions::for_model(self.model())
        }
    }

    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>> {
        match self.provider {
            ProviderKind::Anthropic => {
                let config = self.anthropic.clone().ok_or_else(|| {
                    AgentError::Config("LLM_PROVIDER=anthropic needs ANTHROPIC_API_KEY".into())
                })?;
                Ok(Arc::new(AnthropicProvider::from_config(config)?))
            }
            #[cfg(feature = "ollama")]
            ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::from_config(self.ollama.clone()))),
            #[cfg(not(feature = "ollama"))]
            ProviderKind::Ollama => Err(AgentError::Config(
                "this build was compiled without the ollama feature".into(),
            )),
        }
    }

    pub fn build_toolkit(&self) -> Option<Arc<dyn RemoteToolkit>> {
        self.toolkit
            .clone()
            .map(|c| Arc::new(ToolhouseClient::new(c)) as Arc<dyn RemoteToolkit>)
    }

    /// Register the remote toolkit's tools, if one is configured.
    ///
    /// An unreachable toolkit is logged and skipped so the agents still run
    /// with their local tools.
    pub async fn register_remote_tools(&self, registry: &mut ToolRegistry) -> usize {
        let Some(toolkit) = self.build_toolkit() else {
            tracing::warn!("TOOLHOUSE_API_KEY not set - remote tools disabled");
            return 0;
        };

        match toolkit::register_remote(registry, toolkit).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Remote toolkit unavailable - continuing with local tools");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!(" ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("gpt".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_anthropic_without_key_is_config_error() {
        let config = RuntimeConfig {
            provider: ProviderKind::Anthropic,
            anthropic: None,
            #[cfg(feature = "ollama")]
            ollama: OllamaConfig::default(),
            toolkit: None,
            max_tokens: 1024,
        };
        assert!(matches!(config.build_provider(), Err(AgentError::Config(_))));
        assert!(config.build_toolkit().is_none());
        assert_eq!(config.generation().max_tokens, 1024);
    }
}
