//! Reddit public JSON API client
//!
//! Unauthenticated: every listing is `{base}/r/{sub}/{kind}.json` and a post's
//! details live at `{permalink}/.json`.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{MAX_TOP_COMMENTS, RedditClient};
use crate::error::{EngageError, Result};
use crate::model::{Comment, Post, PostDetails, SearchSort, Timeframe, epoch_to_utc};

/// Public web origin used for post links
pub const REDDIT_WEB: &str = "https://www.reddit.com";

const DEFAULT_USER_AGENT: &str = "RedditEngagementAssistant/1.0";

/// HTTP client configuration
#[derive(Clone, Debug)]
pub struct RedditConfig {
    /// API origin; differs from [`REDDIT_WEB`] only behind a proxy or in tests
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: REDDIT_WEB.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_secs: 20,
        }
    }
}

impl RedditConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("REDDIT_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            user_agent: std::env::var("REDDIT_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_secs: defaults.timeout_secs,
        }
    }
}

/// Client for Reddit's public JSON endpoints
pub struct HttpRedditClient {
    http: reqwest::Client,
    config: RedditConfig,
}

impl HttpRedditClient {
    pub fn new(config: RedditConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(RedditConfig::from_env())
    }

    pub const fn config(&self) -> &RedditConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        tracing::debug!(%url, "Reddit request");

        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EngageError::PostNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(EngageError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| EngageError::InvalidResponse(format!("{url}: {e}")))
    }

    async fn listing(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Post>> {
        let url = format!("{}{path}", self.config.base_url);
        let listing: Listing<ApiPost> = self.get_json(&url, query).await?;
        let posts: Vec<Post> = listing.into_posts();
        tracing::info!(%path, count = posts.len(), "Fetched Reddit posts");
        Ok(posts)
    }

    /// JSON endpoint for a post permalink
    pub fn details_url(&self, post_url: &str) -> String {
        let url = post_url.trim();
        let url = url.split(['?', '#']).next().unwrap_or(url);
        let url = match url.strip_prefix(REDDIT_WEB) {
            Some(path) => format!("{}{path}", self.config.base_url),
            None => url.to_string(),
        };
        if url.ends_with('/') {
            format!("{url}.json")
        } else {
            format!("{url}/.json")
        }
    }
}

#[async_trait]
impl RedditClient for HttpRedditClient {
    async fn hot_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>> {
        self.listing(&format!("/r/{subreddit}/hot.json"), &[("limit", limit.to_string())])
            .await
    }

    async fn new_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>> {
        self.listing(&format!("/r/{subreddit}/new.json"), &[("limit", limit.to_string())])
            .await
    }

    async fn top_posts(&self, subreddit: &str, timeframe: Timeframe, limit: u32) -> Result<Vec<Post>> {
        self.listing(
            &format!("/r/{subreddit}/top.json"),
            &[("t", timeframe.as_str().to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn search_posts(
        &self,
        query: &str,
        subreddit: Option<&str>,
        sort: SearchSort,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("sort", sort.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let path = match subreddit {
            Some(sub) => {
                params.push(("restrict_sr", "on".to_string()));
                format!("/r/{sub}/search.json")
            }
            None => "/search.json".to_string(),
        };
        self.listing(&path, &params).await
    }

    async fn post_details(&self, url: &str) -> Result<PostDetails> {
        let api_url = self.details_url(url);
        let (post_listing, comment_listing): (Listing<ApiPost>, Listing<ApiComment>) =
            self.get_json(&api_url, &[]).await?;

        let post = post_listing
            .into_posts()
            .into_iter()
            .next()
            .ok_or_else(|| EngageError::PostNotFound(url.to_string()))?;

        let top_comments = comment_listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| thing.data.into_comment())
            .take(MAX_TOP_COMMENTS)
            .collect();

        Ok(PostDetails { post, top_comments })
    }

    fn name(&self) -> &str {
        "Reddit"
    }
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    data: T,
}

impl Listing<ApiPost> {
    fn into_posts(self) -> Vec<Post> {
        self.data.children.into_iter().map(|t| t.data.into()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiPost {
    title: String,
    permalink: String,
    subreddit: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    is_self: bool,
}

impl From<ApiPost> for Post {
    fn from(p: ApiPost) -> Self {
        Self {
            title: p.title,
            url: format!("{REDDIT_WEB}{}", p.permalink),
            subreddit: p.subreddit,
            author: p.author,
            score: p.score,
            num_comments: p.num_comments,
            created: epoch_to_utc(p.created_utc),
            selftext: p.selftext,
            is_self: p.is_self,
        }
    }
}

/// Comment listings mix `t1` comments with `more` stubs that have no body
#[derive(Debug, Default, Deserialize)]
struct ApiComment {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    score: Option<i64>,
}

impl ApiComment {
    fn into_comment(self) -> Option<Comment> {
        Some(Comment {
            body: self.body?,
            author: self.author.unwrap_or_else(|| "[deleted]".into()),
            score: self.score.unwrap_or(0),
        })
    }
}
