//! Post Details Tool
//!
//! A single post with its top comments.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;

use crate::prompt;
use crate::reddit::RedditClient;

/// Tool for reading one post and its top comments
pub struct PostDetailsTool {
    reddit: Arc<dyn RedditClient>,
}

impl PostDetailsTool {
    pub fn new(reddit: Arc<dyn RedditClient>) -> Self {
        Self { reddit }
    }
}

#[async_trait]
impl Tool for PostDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "reddit_post_details".into(),
            description: "Read a Reddit post and its top comments from the post URL.".into(),
            parameters: vec![ParameterSchema::new(
                "url",
                "string",
                "Full post URL (https://www.reddit.com/r/.../comments/...)",
                true,
            )],
            category: Some("reddit".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let Some(url) = call.str_arg("url").and_then(prompt::find_reddit_url) else {
            return Ok(ToolResult::failure(
                "reddit_post_details",
                "Expected a Reddit post URL containing /r/<sub>/comments/",
            ));
        };

        match self.reddit.post_details(&url).await {
            Ok(details) => Ok(ToolResult::success("reddit_post_details", prompt::format_post_details(&details).trim_end())
                .with_data(serde_json::to_value(&details)?)),
            Err(e) => Ok(ToolResult::failure("reddit_post_details", e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::MockRedditClient;

    fn call(url: &str) -> ToolCall {
        let mut arguments = std::collections::HashMap::new();
        arguments.insert("url".to_string(), serde_json::json!(url));
        ToolCall {
            name: "reddit_post_details".into(),
            arguments,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_details() {
        let tool = PostDetailsTool::new(Arc::new(MockRedditClient::new()));
        let result = tool
            .execute(&call("https://www.reddit.com/r/ChatGPT/comments/2b3c4d/how_do_you_keep_long_chats_on_track/"))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output.contains("Post Title: How do you keep long chats on track?"));
        assert!(result.output.contains("Top Comments:"));
    }

    #[tokio::test]
    async fn test_rejects_non_reddit_url() {
        let tool = PostDetailsTool::new(Arc::new(MockRedditClient::new()));
        let result = tool.execute(&call("https://example.com/post")).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_missing_post() {
        let tool = PostDetailsTool::new(Arc::new(MockRedditClient::new()));
        let result = tool
            .execute(&call("https://www.reddit.com/r/rust/comments/zzz/gone/"))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("not found"));
    }
}
