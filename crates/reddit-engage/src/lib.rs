//! # reddit-engage
//!
//! Reddit engagement assistant: fetch posts, draft one upvote-worthy reply per
//! post with an LLM agent, pull the replies out of the model's markdown table
//! and mail a digest.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ RedditClient │──►│  selection   │──►│  Response     │──►│   Digest     │
//! │ hot/new/top  │   │ (Engagement  │   │  Generator    │   │  compose +   │
//! │ search       │   │   Context)   │   │  + extractor  │   │  send_email  │
//! └──────────────┘   └──────────────┘   └───────────────┘   └──────────────┘
//! ```
//!
//! Each stage reads and writes an explicit [`EngagementContext`]; nothing is
//! kept in globals.

pub mod context;
pub mod digest;
pub mod error;
pub mod extract;
pub mod generate;
pub mod model;
pub mod prompt;
pub mod reddit;
pub mod svckit;

pub use context::{ContextId, ContextStore, EngagementContext, MemoryContextStore};
pub use digest::{Delivery, Digest, DigestMailer};
pub use error::{EngageError, Result};
pub use extract::{Association, ExtractionReport, MatchKind, extract};
pub use generate::{Generation, ResponseGenerator};
pub use model::{Comment, ExtractedRow, Post, PostDetails, PostKind, Rating, SearchSort, SourceRecord, Timeframe};
pub use reddit::{HttpRedditClient, MockRedditClient, RedditClient, RedditConfig};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{PostDetailsTool, RedditPostsTool, RedditSearchTool, register_all};
}

/// Subreddits offered when the user has not picked any
pub const POPULAR_SUBREDDITS: [&str; 12] = [
    "LocalLLaMA",
    "ChatGPT",
    "MachineLearning",
    "artificial",
    "datascience",
    "programming",
    "Python",
    "learnprogramming",
    "AskReddit",
    "explainlikeimfive",
    "IAmA",
    "todayilearned",
];
