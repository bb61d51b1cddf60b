use std::sync::Arc;

use agent_core::{
    Agent, AgentConfig, Conversation, GenerationOptions, LlmProvider, Message, ToolRegistry,
};
use serde::Serialize;

use super::{JobOpening, extract_jobs};
use crate::error::{Result, required};

/// Completion budget for a search reply
const SEARCH_MAX_TOKENS: u32 = 1024;

/// Openings found for one query
#[derive(Clone, Debug, Serialize)]
pub struct JobSearchResult {
    pub location: String,
    pub position: String,
    pub jobs: Vec<JobOpening>,
    /// Final model reply the jobs were extracted from
    pub raw: String,
    /// Tool calls made while searching
    pub tool_calls: usize,
}

/// Searches for openings with whatever web tools the registry holds
pub struct JobSearch {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    generation: GenerationOptions,
}

impl JobSearch {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, mut generation: GenerationOptions) -> Self {
        generation.max_tokens = SEARCH_MAX_TOKENS;
        Self {
            provider,
            tools,
            generation,
        }
    }

    pub async fn search(&self, location: &str, position: &str) -> Result<JobSearchResult> {
        let location = required("location", location)?;
        let position = required("position", position)?;

        let agent = Agent::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            AgentConfig {
                system_prompt: format!("Search for job openings in {location}"),
                generation: self.generation.clone(),
                ..AgentConfig::default()
            },
        );

        tracing::info!(%location, %position, "Searching for job openings");

        let mut conversation = Conversation::with_system_prompt(agent.build_system_prompt());
        conversation.push(Message::user(search_request(&location, &position)));
        let outcome = agent.run_traced(&mut conversation).await?;

        let jobs = extract_jobs(&outcome.reply);
        tracing::info!(found = jobs.len(), tools = outcome.tool_results.len(), "Job search finished");

        Ok(JobSearchResult {
            location,
            position,
            jobs,
            raw: outcome.reply,
            tool_calls: outcome.tool_results.len(),
        })
    }
}

fn search_request(location: &str, position: &str) -> String {
    format!(
        "Search for job openings for following job position:{position} in the following \
         location:{location}. Return the results as a JSON object with format \
         {{\"job_openings\": [{{\"title\": \"Job Title\", \"link\": \"URL\"}}]}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResearchError;
    use agent_core::testing::ScriptedProvider;

    fn searcher(provider: Arc<ScriptedProvider>) -> JobSearch {
        JobSearch::new(provider, Arc::new(ToolRegistry::new()), GenerationOptions::for_model("scripted"))
    }

    #[tokio::test]
    async fn test_search_extracts_openings() {
        let provider = Arc::new(ScriptedProvider::new([
            "```json\n{\"job_openings\": [{\"title\": \"Rust Engineer\", \"link\": \"https://jobs.example/rust\"}]}\n```",
        ]));
        let result = searcher(provider.clone()).search(" spain ", "software engineer").await.unwrap();

        assert_eq!(result.location, "spain");
        assert_eq!(result.jobs.len(), 1);
        assert_eq!(result.jobs[0].title, "Rust Engineer");
        assert_eq!(result.tool_calls, 0);

        let prompt = &provider.prompts()[0];
        assert!(prompt[0].content.starts_with("Search for job openings in spain"));
        assert!(prompt[1].content.contains("job position:software engineer in the following location:spain"));
        assert!(prompt[1].content.contains(r#"{"job_openings": [{"title": "Job Title", "link": "URL"}]}"#));
    }

    #[tokio::test]
    async fn test_search_with_no_openings() {
        let provider = Arc::new(ScriptedProvider::new(["Nothing matched, sorry."]));
        let result = searcher(provider).search("atlantis", "diver").await.unwrap();
        assert!(result.jobs.is_empty());
        assert_eq!(result.raw, "Nothing matched, sorry.");
    }

    #[tokio::test]
    async fn test_search_requires_location() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let result = searcher(provider.clone()).search("", "engineer").await;
        assert!(matches!(result, Err(ResearchError::InvalidInput(_))));
        assert_eq!(provider.calls(), 0);
    }
}
