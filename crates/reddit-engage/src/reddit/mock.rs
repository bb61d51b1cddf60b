//! Mock Reddit Client
//!
//! For tests and offline demos. Serves a small static catalogue of posts.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as Age;

use super::{MAX_TOP_COMMENTS, RedditClient};
use crate::error::{EngageError, Result};
use crate::model::{Comment, Post, PostDetails, SearchSort, Timeframe, epoch_to_utc};

/// 2025-01-01T00:00:00Z, the catalogue's "now"
const CATALOGUE_NOW: f64 = 1_735_689_600.0;

/// Mock client with static posts
pub struct MockRedditClient {
    posts: Vec<Post>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
}

impl Default for MockRedditClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRedditClient {
    pub fn new() -> Self {
        Self::with_posts(catalogue())
    }

    /// Serve exactly these posts
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts,
            failing: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Make listings for `subreddit` fail (for testing error paths)
    #[must_use]
    pub fn failing_on(mut self, subreddit: &str) -> Self {
        self.failing.insert(subreddit.to_lowercase());
        self
    }

    /// Number of listing, search and detail requests served
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn listing(&self, subreddit: &str) -> Result<Vec<Post>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let wanted = subreddit.to_lowercase();
        if self.failing.contains(&wanted) {
            return Err(EngageError::Status {
                status: 503,
                url: format!("mock://r/{subreddit}"),
            });
        }

        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| wanted == "all" || p.subreddit.to_lowercase() == wanted)
            .cloned()
            .collect();

        if posts.is_empty() {
            posts = placeholder_posts(subreddit);
        }
        Ok(posts)
    }
}

fn truncate(mut posts: Vec<Post>, limit: u32) -> Vec<Post> {
    posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    posts
}

#[async_trait]
impl RedditClient for MockRedditClient {
    async fn hot_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>> {
        let mut posts = self.listing(subreddit)?;
        // hot ~ score weighted by comment activity
        posts.sort_by_key(|p| std::cmp::Reverse(p.score + i64::try_from(p.num_comments).unwrap_or(0) * 2));
        Ok(truncate(posts, limit))
    }

    async fn new_posts(&self, subreddit: &str, limit: u32) -> Result<Vec<Post>> {
        let mut posts = self.listing(subreddit)?;
        posts.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(truncate(posts, limit))
    }

    async fn top_posts(&self, subreddit: &str, timeframe: Timeframe, limit: u32) -> Result<Vec<Post>> {
        let now = epoch_to_utc(CATALOGUE_NOW);
        let window = match timeframe {
            Timeframe::Hour => Some(Age::hours(1)),
            Timeframe::Day => Some(Age::days(1)),
            Timeframe::Week => Some(Age::weeks(1)),
            Timeframe::Month => Some(Age::days(31)),
            Timeframe::Year => Some(Age::days(365)),
            Timeframe::All => None,
        };

        let mut posts: Vec<Post> = self
            .listing(subreddit)?
            .into_iter()
            .filter(|p| window.is_none_or(|w| now - p.created <= w))
            .collect();
        posts.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(truncate(posts, limit))
    }

    async fn search_posts(
        &self,
        query: &str,
        subreddit: Option<&str>,
        sort: SearchSort,
        limit: u32,
    ) -> Result<Vec<Post>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| subreddit.is_none_or(|s| p.subreddit.eq_ignore_ascii_case(s)))
            .filter(|p| {
                let haystack = format!("{} {}", p.title, p.selftext).to_lowercase();
                terms.iter().any(|t| haystack.contains(t.as_str()))
            })
            .cloned()
            .collect();

        match sort {
            SearchSort::New => posts.sort_by(|a, b| b.created.cmp(&a.created)),
            SearchSort::Top | SearchSort::Hot => posts.sort_by(|a, b| b.score.cmp(&a.score)),
            SearchSort::Comments => posts.sort_by(|a, b| b.num_comments.cmp(&a.num_comments)),
            SearchSort::Relevance => {}
        }
        Ok(truncate(posts, limit))
    }

    async fn post_details(&self, url: &str) -> Result<PostDetails> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let wanted = url.trim().trim_end_matches('/');
        let post = self
            .posts
            .iter()
            .find(|p| p.url.trim_end_matches('/') == wanted)
            .cloned()
            .ok_or_else(|| EngageError::PostNotFound(url.to_string()))?;

        let top_comments = canned_comments(&post)
            .into_iter()
            .take(MAX_TOP_COMMENTS)
            .collect();

        Ok(PostDetails { post, top_comments })
    }

    fn name(&self) -> &str {
        "MockReddit"
    }

    fn pause(&self) -> Duration {
        Duration::ZERO
    }
}

#[allow(clippy::too_many_arguments)]
fn post(
    subreddit: &str,
    id: &str,
    slug: &str,
    title: &str,
    author: &str,
    score: i64,
    num_comments: u64,
    hours_ago: i64,
    selftext: &str,
) -> Post {
    Post {
        title: title.into(),
        url: format!("https://www.reddit.com/r/{subreddit}/comments/{id}/{slug}/"),
        subreddit: subreddit.into(),
        author: author.into(),
        score,
        num_comments,
        created: epoch_to_utc(CATALOGUE_NOW) - Age::hours(hours_ago),
        is_self: !selftext.is_empty(),
        selftext: selftext.into(),
    }
}

fn catalogue() -> Vec<Post> {
    vec![
        post(
            "LocalLLaMA",
            "1a2b3c",
            "best_model_for_coding_on_24gb",
            "Best model for coding on a single 24GB card?",
            "vram_hoarder",
            842,
            311,
            5,
            "I have a 3090 and want something that can handle refactors across a medium codebase. What are people running?",
        ),
        post(
            "LocalLLaMA",
            "1a2b3d",
            "quantization_finally_clicked",
            "Quantization finally clicked for me, here is a visual explainer",
            "bits_and_bytes",
            1290,
            96,
            20,
            "",
        ),
        post(
            "ChatGPT",
            "2b3c4d",
            "how_do_you_keep_long_chats_on_track",
            "How do you keep long chats on track?",
            "prompt_gardener",
            415,
            188,
            9,
            "After ~50 messages the model starts forgetting constraints. Do you summarize, restart, or something else?",
        ),
        post(
            "ChatGPT",
            "2b3c4e",
            "used_it_to_plan_my_garden",
            "Used it to plan my whole vegetable garden",
            "green_thumbs_up",
            2203,
            143,
            30,
            "",
        ),
        post(
            "rust",
            "3c4d5e",
            "what_are_you_building_this_week",
            "What are you building this week?",
            "weekly_bot",
            120,
            254,
            2,
            "Share your projects, big or small.",
        ),
        post(
            "rust",
            "3c4d5f",
            "async_closures_are_stable",
            "Async closures are stable, what changes for your code?",
            "ferris_fan",
            980,
            167,
            50,
            "Curious which patterns people are replacing now that async closures landed.",
        ),
        post(
            "Python",
            "4d5e6f",
            "uv_replaced_my_whole_toolchain",
            "uv replaced my whole toolchain",
            "snake_case_only",
            1544,
            402,
            70,
            "pip, venv, pyenv and pipx are all gone from my setup. Anything I am missing?",
        ),
    ]
}

fn placeholder_posts(subreddit: &str) -> Vec<Post> {
    vec![
        post(
            subreddit,
            "9z9y9x",
            "weekly_discussion_thread",
            &format!("r/{subreddit} weekly discussion thread"),
            "AutoModerator",
            42,
            87,
            3,
            "Ask anything and share what you are working on.",
        ),
        post(
            subreddit,
            "9z9y9w",
            "beginner_questions",
            &format!("Beginner questions for r/{subreddit}"),
            "AutoModerator",
            17,
            33,
            12,
            "",
        ),
    ]
}

fn canned_comments(post: &Post) -> Vec<Comment> {
    let samples = [
        ("early_bird", "Great question, following for answers.", 120),
        ("practical_pat", "I tried this last month and wrote up my notes, happy to share.", 88),
        ("skeptic_sam", "Depends a lot on what you mean by best, can you share your constraints?", 54),
        ("lurker_lou", "Bookmarking this thread.", 12),
        ("deep_diver", "The top answer covers most of it but misses the memory bandwidth angle.", 9),
        ("late_larry", "Late to the party but +1 to everything above.", 2),
    ];
    let count = usize::try_from(post.num_comments).unwrap_or(usize::MAX).min(samples.len());
    samples
        .iter()
        .take(count)
        .map(|(author, body, score)| Comment {
            author: (*author).into(),
            body: (*body).into(),
            score: *score,
        })
        .collect()
}
