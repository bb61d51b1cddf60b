//! Reddit Search Tool

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;

use super::clamp_limit;
use crate::model::SearchSort;
use crate::prompt;
use crate::reddit::{RedditClient, normalize_subreddit};

/// Tool for searching posts across Reddit
pub struct RedditSearchTool {
    reddit: Arc<dyn RedditClient>,
}

impl RedditSearchTool {
    pub fn new(reddit: Arc<dyn RedditClient>) -> Self {
        Self { reddit }
    }
}

#[async_trait]
impl Tool for RedditSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "reddit_search".into(),
            description: "Search Reddit posts by keyword, optionally inside one subreddit.".into(),
            parameters: vec![
                ParameterSchema::new("query", "string", "Search terms", true),
                ParameterSchema::new("subreddit", "string", "Limit the search to this subreddit", false),
                ParameterSchema::new("sort", "string", "relevance, hot, new, top or comments", false)
                    .with_default(serde_json::json!("relevance")),
                ParameterSchema::new("limit", "integer", "Maximum results (1-25)", false)
                    .with_default(serde_json::json!(5)),
            ],
            category: Some("reddit".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default().trim();
        if query.is_empty() {
            return Ok(ToolResult::failure("reddit_search", "Please provide a search query"));
        }

        let subreddit = match call.str_arg("subreddit").filter(|s| !s.trim().is_empty()) {
            Some(name) => match normalize_subreddit(name) {
                Ok(sub) => Some(sub),
                Err(e) => return Ok(ToolResult::failure("reddit_search", e.to_string())),
            },
            None => None,
        };
        let sort = SearchSort::parse_or_relevance(call.str_arg("sort").unwrap_or_default());
        let limit = clamp_limit(call.u64_arg("limit"), 5);

        match self
            .reddit
            .search_posts(query, subreddit.as_deref(), sort, limit)
            .await
        {
            Ok(posts) if posts.is_empty() => Ok(ToolResult::success(
                "reddit_search",
                format!("No posts found for '{query}'."),
            )),
            Ok(posts) => Ok(ToolResult::success("reddit_search", prompt::format_posts_for_terminal(&posts).trim_end())
                .with_data(serde_json::to_value(&posts)?)),
            Err(e) => Ok(ToolResult::failure("reddit_search", e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::MockRedditClient;

    fn call(query: &str) -> ToolCall {
        let mut arguments = std::collections::HashMap::new();
        arguments.insert("query".to_string(), serde_json::json!(query));
        ToolCall {
            name: "reddit_search".into(),
            arguments,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_search_hits() {
        let tool = RedditSearchTool::new(Arc::new(MockRedditClient::new()));
        let result = tool.execute(&call("async closures")).await.unwrap();
        assert!(result.success);
        assert!(result.output.contains("Async closures are stable"));
    }

    #[tokio::test]
    async fn test_search_misses_and_empty_query() {
        let tool = RedditSearchTool::new(Arc::new(MockRedditClient::new()));

        let result = tool.execute(&call("zzzzzz")).await.unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("No posts found"));

        let result = tool.execute(&call("  ")).await.unwrap();
        assert!(!result.success);
    }
}
