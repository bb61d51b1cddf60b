//! Application State

use std::sync::Arc;

use agent_core::{
    GenerationOptions, LlmProvider, MemorySessionStore, SessionStore, ToolRegistry,
    tool::DateTimeTool,
};
use agent_runtime::RuntimeConfig;
use reddit_engage::{
    ContextStore, DigestMailer, MemoryContextStore, RedditClient, ResponseGenerator,
    reddit::client_from_env, tools::register_all,
};
use research_agents::{DueDiligence, JobSearch, ReportMailer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Anthropic, Ollama)
    pub provider: Arc<dyn LlmProvider>,

    /// Local tools plus whatever the remote toolkit offers
    pub tools: Arc<ToolRegistry>,

    /// Default model and sampling settings
    pub generation: GenerationOptions,

    /// Chat conversations keyed by conversation id
    pub sessions: Arc<dyn SessionStore>,

    /// Engagement contexts keyed by context id
    pub contexts: Arc<dyn ContextStore>,

    pub reddit: Arc<dyn RedditClient>,

    pub generator: Arc<ResponseGenerator>,

    pub mailer: Arc<DigestMailer>,

    pub jobs: Arc<JobSearch>,

    pub diligence: Arc<DueDiligence>,

    /// Mails due-diligence reports
    pub reports: Arc<ReportMailer>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        reddit: Arc<dyn RedditClient>,
        generation: GenerationOptions,
    ) -> Self {
        let tools = Arc::new(tools);
        Self {
            generator: Arc::new(ResponseGenerator::new(
                Arc::clone(&provider),
                Arc::clone(&tools),
                generation.clone(),
            )),
            mailer: Arc::new(DigestMailer::new(
                Arc::clone(&provider),
                Arc::clone(&tools),
                generation.clone(),
            )),
            jobs: Arc::new(JobSearch::new(Arc::clone(&provider), Arc::clone(&tools), generation.clone())),
            diligence: Arc::new(DueDiligence::new(
                Arc::clone(&provider),
                Arc::clone(&tools),
                generation.clone(),
            )),
            reports: Arc::new(ReportMailer::new(
                Arc::clone(&provider),
                Arc::clone(&tools),
                generation.clone(),
            )),
            provider,
            tools,
            generation,
            sessions: Arc::new(MemorySessionStore::new()),
            contexts: Arc::new(MemoryContextStore::new()),
            reddit,
        }
    }

    /// Build everything from environment variables
    pub async fn from_env() -> anyhow::Result<Self> {
        let runtime = RuntimeConfig::from_env()?;
        tracing::info!(provider = %runtime.provider, model = %runtime.model(), "LLM configured");

        let provider = runtime.build_provider()?;
        match provider.health_check().await {
            Ok(true) => tracing::info!("✓ Connected to {}", runtime.provider),
            Ok(false) | Err(_) => {
                tracing::warn!("⚠ {} not reachable - chat requests will fail", runtime.provider);
            }
        }

        let reddit = client_from_env()?;

        let mut tools = ToolRegistry::new();
        tools.register(DateTimeTool);
        register_all(&mut tools, &reddit);
        let remote = runtime.register_remote_tools(&mut tools).await;

        tracing::info!("Registered {} tools ({} remote):", tools.len(), remote);
        for name in tools.names() {
            tracing::info!("  • {}", name);
        }

        Ok(Self::new(provider, tools, reddit, runtime.generation()))
    }
}
