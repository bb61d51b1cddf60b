//! Subreddit Listing Tool
//!
//! Hot, new or top posts from one or more subreddits.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;

use super::clamp_limit;
use crate::model::{PostKind, Timeframe};
use crate::prompt;
use crate::reddit::{RedditClient, normalize_subreddit};

/// Tool for listing subreddit posts
pub struct RedditPostsTool {
    reddit: Arc<dyn RedditClient>,
}

impl RedditPostsTool {
    pub fn new(reddit: Arc<dyn RedditClient>) -> Self {
        Self { reddit }
    }
}

#[async_trait]
impl Tool for RedditPostsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "reddit_posts".into(),
            description: "Fetch hot, new or top posts from one or more subreddits. Returns title, URL, score, comment count and text.".into(),
            parameters: vec![
                ParameterSchema::new(
                    "subreddits",
                    "string",
                    "Comma-separated subreddit names without 'r/' (e.g., 'LocalLLaMA,ChatGPT')",
                    true,
                ),
                ParameterSchema::new("kind", "string", "Listing to read", false)
                    .with_default(serde_json::json!("hot"))
                    .with_enum(vec![
                        serde_json::json!("hot"),
                        serde_json::json!("new"),
                        serde_json::json!("top"),
                    ]),
                ParameterSchema::new(
                    "timeframe",
                    "string",
                    "Window for top posts: hour, day, week, month, year or all",
                    false,
                )
                .with_default(serde_json::json!("day")),
                ParameterSchema::new("limit", "integer", "Posts per subreddit (1-25)", false)
                    .with_default(serde_json::json!(3)),
            ],
            category: Some("reddit".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let mut subreddits = Vec::new();
        let mut rejected = Vec::new();
        for name in call.str_arg("subreddits").unwrap_or_default().split(',') {
            if name.trim().is_empty() {
                continue;
            }
            match normalize_subreddit(name) {
                Ok(sub) => subreddits.push(sub),
                Err(_) => rejected.push(name.trim().to_string()),
            }
        }

        if subreddits.is_empty() {
            return Ok(ToolResult::failure("reddit_posts", "No valid subreddit names given"));
        }

        let kind: PostKind = call.str_arg("kind").unwrap_or("hot").parse().unwrap_or_default();
        let timeframe = Timeframe::parse_or_day(call.str_arg("timeframe").unwrap_or("day"));
        let limit = clamp_limit(call.u64_arg("limit"), 3);

        let posts = match self
            .reddit
            .posts_from_subreddits(&subreddits, kind, timeframe, limit)
            .await
        {
            Ok(posts) => posts,
            Err(e) => return Ok(ToolResult::failure("reddit_posts", e.to_string())),
        };

        let mut output = prompt::format_posts_for_terminal(&posts);
        if !rejected.is_empty() {
            output.push_str(&format!("\nIgnored invalid names: {}\n", rejected.join(", ")));
        }

        Ok(ToolResult::success("reddit_posts", output.trim_end())
            .with_data(serde_json::to_value(&posts)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::MockRedditClient;
    use std::collections::HashMap;

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall {
            name: "reddit_posts".into(),
            arguments: serde_json::from_value::<HashMap<String, serde_json::Value>>(args).unwrap(),
            id: None,
        }
    }

    #[tokio::test]
    async fn test_lists_posts_from_several_subreddits() {
        let tool = RedditPostsTool::new(Arc::new(MockRedditClient::new()));
        let result = tool
            .execute(&call(serde_json::json!({"subreddits": "r/LocalLLaMA, rust", "limit": "1"})))
            .await
            .unwrap();

        assert!(result.success);
        let posts = result.data.unwrap();
        assert_eq!(posts.as_array().unwrap().len(), 2);
        assert!(result.output.contains("Subreddit: r/LocalLLaMA"));
        assert!(result.output.contains("Subreddit: r/rust"));
    }

    #[tokio::test]
    async fn test_invalid_names_only() {
        let tool = RedditPostsTool::new(Arc::new(MockRedditClient::new()));
        let result = tool
            .execute(&call(serde_json::json!({"subreddits": "not valid, ,"})))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_not_raised() {
        let tool = RedditPostsTool::new(Arc::new(MockRedditClient::new().failing_on("down")));
        let result = tool
            .execute(&call(serde_json::json!({"subreddits": "down"})))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("503"));
    }
}
