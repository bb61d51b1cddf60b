//! Response Generation
//!
//! Runs the engagement agent over the selected posts and turns its reply into
//! one suggested response per post.
//!
//! ```text
//! selected posts ─► request ─► agent (tool loop) ─► extract
//!                                   ▲                  │ no table
//!                                   └── table request ◄┘ (once)
//! ```

use std::sync::Arc;

use agent_core::{
    Agent, AgentConfig, Conversation, GenerationOptions, LlmProvider, Message, ToolRegistry,
};
use serde::Serialize;

use crate::context::EngagementContext;
use crate::error::{EngageError, Result};
use crate::extract::{self, ExtractionReport};
use crate::model::Post;
use crate::prompt;

/// Outcome of one generation run
#[derive(Clone, Debug, Serialize)]
pub struct Generation {
    /// Final model reply
    pub analysis: String,

    pub report: ExtractionReport,

    /// Whether the explicit table request had to be sent
    pub retried: bool,
}

/// Drafts engagement responses with an agent
pub struct ResponseGenerator {
    agent: Agent,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, generation: GenerationOptions) -> Self {
        let config = AgentConfig {
            system_prompt: prompt::ENGAGEMENT_PROMPT.into(),
            generation,
            ..AgentConfig::default()
        };
        Self {
            agent: Agent::new(provider, tools, config),
        }
    }

    /// Generate responses for `posts`
    pub async fn generate(&self, posts: &[Post]) -> Result<Generation> {
        if posts.is_empty() {
            return Err(EngageError::Empty("no posts selected".into()));
        }

        tracing::info!(posts = posts.len(), "Generating engagement responses");

        let mut conversation = Conversation::with_system_prompt(self.agent.build_system_prompt());
        conversation.push(Message::user(prompt::generation_request(posts)));

        let outcome = self.agent.run_traced(&mut conversation).await?;
        if !outcome.tool_results.is_empty() {
            tracing::debug!(tools = outcome.tool_results.len(), "Tools used while drafting");
        }

        let report = extract::extract(&outcome.reply, posts);
        if report.table_found {
            return Ok(Generation {
                analysis: outcome.reply,
                report,
                retried: false,
            });
        }

        tracing::warn!("Reply had no response table, asking again");
        conversation.push(Message::user(prompt::TABLE_REQUEST));
        let reply = self.agent.run(&mut conversation).await?;
        let report = extract::extract(&reply, posts);

        tracing::info!(
            matched = report.matched(),
            total = report.len(),
            table = report.table_found,
            "Responses extracted"
        );

        Ok(Generation {
            analysis: reply,
            report,
            retried: true,
        })
    }

    /// Generate for the context's selection and store the result in it
    pub async fn generate_for(&self, context: &mut EngagementContext) -> Result<Generation> {
        let posts = context.selected_posts();
        let generation = self.generate(&posts).await?;
        context.set_responses(posts, generation.analysis.clone(), generation.report.clone());
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MatchKind;
    use crate::model::Rating;
    use crate::reddit::{MockRedditClient, RedditClient};
    use agent_core::testing::ScriptedProvider;

    async fn rust_posts() -> Vec<Post> {
        MockRedditClient::new().hot_posts("rust", 5).await.unwrap()
    }

    fn table_for(posts: &[Post]) -> String {
        let mut out = String::from(
            "Here you go:\n\n| Post Title | Suggested Response | Engagement Potential |\n|---|---|---|\n",
        );
        for p in posts {
            out.push_str(&format!("| {} | Reply to {} | High |\n", p.title, p.subreddit));
        }
        out
    }

    fn generator(provider: Arc<ScriptedProvider>) -> ResponseGenerator {
        ResponseGenerator::new(provider, Arc::new(ToolRegistry::new()), GenerationOptions::default())
    }

    #[tokio::test]
    async fn test_single_pass_with_table() {
        let posts = rust_posts().await;
        let provider = Arc::new(ScriptedProvider::new([table_for(&posts)]));
        let generation = generator(provider.clone()).generate(&posts).await.unwrap();

        assert!(!generation.retried);
        assert_eq!(provider.calls(), 1);
        assert!(generation.report.iter().all(|a| a.kind == MatchKind::Exact));
        assert_eq!(generation.report.entries[0].rating(), &Rating::High);

        let prompt = &provider.prompts()[0];
        assert!(prompt[0].content.contains("REQUIRED FORMAT"));
        assert!(prompt[1].content.contains(&posts[0].title));
    }

    #[tokio::test]
    async fn test_retries_once_without_table() {
        let posts = rust_posts().await;
        let provider = Arc::new(ScriptedProvider::new([
            "These are all great posts, engage thoughtfully!".to_string(),
            table_for(&posts),
        ]));
        let generation = generator(provider.clone()).generate(&posts).await.unwrap();

        assert!(generation.retried);
        assert_eq!(provider.calls(), 2);
        assert_eq!(generation.report.matched(), posts.len());

        let second = &provider.prompts()[1];
        assert!(second.last().unwrap().content.contains("proper markdown table"));
    }

    #[tokio::test]
    async fn test_second_miss_degrades_to_placeholders() {
        let posts = rust_posts().await;
        let provider = Arc::new(ScriptedProvider::new(["nope", "still nope"]));
        let generation = generator(provider).generate(&posts).await.unwrap();

        assert_eq!(generation.report.len(), posts.len());
        assert!(generation.report.iter().all(|a| a.is_placeholder()));
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let result = generator(provider.clone()).generate(&[]).await;

        assert!(matches!(result, Err(EngageError::Empty(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_for_context() {
        let posts = rust_posts().await;
        let provider = Arc::new(ScriptedProvider::new([table_for(&posts[..1])]));

        let mut ctx = EngagementContext::new();
        ctx.set_posts(posts.clone());
        ctx.select(&[0]).unwrap();
        generator(provider).generate_for(&mut ctx).await.unwrap();

        assert!(ctx.has_responses());
        assert_eq!(ctx.responded_posts().len(), 1);
        assert_eq!(ctx.report().unwrap().get(&posts[0].url).unwrap().response(), "Reply to rust");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let posts = rust_posts().await;
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let result = generator(provider).generate(&posts).await;
        assert!(matches!(result, Err(EngageError::Agent(_))));
    }
}
