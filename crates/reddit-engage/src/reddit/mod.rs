//! Reddit Integration
//!
//! Read-only access to subreddit listings, search and post details.

mod http;
mod mock;

pub use http::{HttpRedditClient, RedditConfig};
pub use mock::MockRedditClient;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{EngageError, Result};
use crate::model::{Post, PostDetails, PostKind, SearchSort, Timeframe};
use crate::prompt;

/// Comments kept per post in [`RedditClient::post_details`]
pub const MAX_TOP_COMMENTS: usize = 5;

/// Pause between subreddits in [`RedditClient::posts_from_subreddits`]
pub const SUBREDDIT_PAUSE: Duration = Duration::from_millis(500);

/// Reddit client trait (Strategy pattern)
///
/// The HTTP client talks to Reddit's public JSON API; the mock serves static
/// posts for tests and offline demos.
#[async_trait]
pub trait RedditClient: Send + Sync {
    async fn hot_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>>;

    async fn new_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>>;

    async fn top_posts(&self, subreddit: &str, timeframe: Timeframe, limit: u32) -> Result<Vec<Post>>;

    /// Search all of Reddit, or one subreddit when given
    async fn search_posts(
        &self,
        query: &str,
        subreddit: Option<&str>,
        sort: SearchSort,
        limit: u32,
    ) -> Result<Vec<Post>>;

    /// A post and up to [`MAX_TOP_COMMENTS`] top-level comments
    async fn post_details(&self, url: &str) -> Result<PostDetails>;

    /// Client name for logs
    fn name(&self) -> &str;

    /// Delay between consecutive subreddit fetches
    fn pause(&self) -> Duration {
        SUBREDDIT_PAUSE
    }

    /// Fetch one listing
    async fn posts(
        &self,
        subreddit: &str,
        kind: PostKind,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Post>> {
        match kind {
            PostKind::Hot => self.hot_posts(subreddit, limit).await,
            PostKind::New => self.new_posts(subreddit, limit).await,
            PostKind::Top => self.top_posts(subreddit, timeframe, limit).await,
        }
    }

    /// Fetch the same listing from several subreddits, one after another.
    ///
    /// A subreddit that fails is logged and skipped. The call only fails
    /// when every subreddit failed.
    async fn posts_from_subreddits(
        &self,
        subreddits: &[String],
        kind: PostKind,
        timeframe: Timeframe,
        limit_per_sub: u32,
    ) -> Result<Vec<Post>> {
        let mut all = Vec::new();
        let mut first_error = None;
        let mut succeeded = 0usize;

        for (i, subreddit) in subreddits.iter().enumerate() {
            if i > 0 && !self.pause().is_zero() {
                tokio::time::sleep(self.pause()).await;
            }

            match self.posts(subreddit, kind, timeframe, limit_per_sub).await {
                Ok(posts) => {
                    succeeded += 1;
                    all.extend(posts);
                }
                Err(e) => {
                    tracing::warn!(client = self.name(), %subreddit, error = %e, "Fetch failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(all),
        }
    }
}

/// Pick the client from the environment: `REDDIT_MOCK=1` serves the static
/// catalogue, anything else talks to Reddit.
pub fn client_from_env() -> Result<Arc<dyn RedditClient>> {
    let mock = std::env::var("REDDIT_MOCK")
        .is_ok_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"));

    if mock {
        tracing::info!("Using mock Reddit client");
        Ok(Arc::new(MockRedditClient::new()))
    } else {
        Ok(Arc::new(HttpRedditClient::from_env()?))
    }
}

/// Normalise a subreddit name: strips `r/` and `/r/` prefixes and slashes
pub fn normalize_subreddit(name: &str) -> Result<String> {
    let trimmed = name.trim().trim_matches('/');
    let bare = trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix("R/"))
        .unwrap_or(trimmed)
        .trim_matches('/');

    if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EngageError::InvalidSelection(format!("invalid subreddit name '{name}'")));
    }
    Ok(bare.to_string())
}

/// If `input` mentions a Reddit post, append its details for the model.
///
/// A failed lookup is logged and the input is returned unchanged.
pub async fn expand_post_link(client: &dyn RedditClient, input: &str) -> String {
    let Some(url) = prompt::find_reddit_url(input) else {
        return input.to_string();
    };

    match client.post_details(&url).await {
        Ok(details) => {
            tracing::debug!(%url, comments = details.top_comments.len(), "Expanded post link");
            prompt::with_post_details(input, &details)
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "Could not fetch linked post");
            input.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_subreddit() {
        assert_eq!(normalize_subreddit("r/LocalLLaMA").unwrap(), "LocalLLaMA");
        assert_eq!(normalize_subreddit("/r/rust/").unwrap(), "rust");
        assert_eq!(normalize_subreddit(" Python ").unwrap(), "Python");
        assert!(normalize_subreddit("").is_err());
        assert!(normalize_subreddit("bad name").is_err());
    }

    #[tokio::test]
    async fn test_posts_from_subreddits_skips_failures() {
        let client = MockRedditClient::new().failing_on("broken");
        let subs = vec!["LocalLLaMA".to_string(), "broken".to_string(), "rust".to_string()];

        let posts = client
            .posts_from_subreddits(&subs, PostKind::Hot, Timeframe::Day, 2)
            .await
            .unwrap();

        assert!(!posts.is_empty());
        assert!(posts.iter().all(|p| p.subreddit != "broken"));
        assert_eq!(client.fetches(), 3);
    }

    #[tokio::test]
    async fn test_posts_from_subreddits_all_failed() {
        let client = MockRedditClient::new().failing_on("a").failing_on("b");
        let subs = vec!["a".to_string(), "b".to_string()];

        let result = client
            .posts_from_subreddits(&subs, PostKind::New, Timeframe::Day, 3)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_expand_post_link() {
        let client = MockRedditClient::new();
        let post = client.hot_posts("rust", 1).await.unwrap().remove(0);

        let input = format!("What should I say to {}?", post.url);
        let expanded = expand_post_link(&client, &input).await;
        assert!(expanded.starts_with(&input));
        assert!(expanded.contains("Here are the details of the post:"));

        assert_eq!(expand_post_link(&client, "just chatting").await, "just chatting");

        let missing = "see https://www.reddit.com/r/rust/comments/zzz/none/";
        assert_eq!(expand_post_link(&client, missing).await, missing);
    }

    #[tokio::test]
    async fn test_posts_dispatches_on_kind() {
        let client = MockRedditClient::new();
        let top = client.posts("rust", PostKind::Top, Timeframe::Week, 10).await.unwrap();
        let mut sorted = top.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        assert_eq!(top, sorted);
    }
}
