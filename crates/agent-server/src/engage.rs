//! Engagement Session Handlers
//!
//! Each request loads the [`EngagementContext`] named in the path, applies one
//! step of the workflow and stores it again.
//!
//! ```text
//! POST sessions ─► POST posts ─► POST select ─► POST responses ─► GET/POST digest
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reddit_engage::{
    ContextId, Delivery, Digest, EngagementContext, MatchKind, POPULAR_SUBREDDITS, Post, PostKind,
    Rating, Timeframe, reddit::normalize_subreddit,
};

use crate::handlers::{ApiError, ListQuery, api_error, engage_error};
use crate::state::AppState;

/// Posts per subreddit when the request names no limit
const DEFAULT_LIMIT: u32 = 3;

/// Upper bound on posts per subreddit
const MAX_LIMIT: u32 = 10;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub posts: usize,
    pub selected: Vec<usize>,
    pub has_responses: bool,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&EngagementContext> for SessionSummary {
    fn from(ctx: &EngagementContext) -> Self {
        Self {
            id: ctx.id.to_string(),
            posts: ctx.posts().len(),
            selected: ctx.selected_indices().to_vec(),
            has_responses: ctx.has_responses(),
            email_sent: ctx.email_sent,
            created_at: ctx.created_at,
            updated_at: ctx.updated_at,
        }
    }
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct FetchPostsRequest {
    /// Defaults to the first two popular subreddits
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub kind: PostKind,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub session_id: String,
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    #[serde(default)]
    pub indices: Vec<usize>,
    /// Select every fetched post, ignoring `indices`
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub session_id: String,
    pub selected: Vec<usize>,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct SuggestedResponse {
    pub title: String,
    pub url: String,
    pub subreddit: String,
    pub response: String,
    pub rating: Rating,
    pub matched_by: MatchKind,
}

#[derive(Debug, Serialize)]
pub struct ResponsesResponse {
    pub session_id: String,
    pub responses: Vec<SuggestedResponse>,
    pub analysis: String,
    pub table_found: bool,
    pub retried: bool,
}

const fn default_include_analysis() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct DigestQuery {
    #[serde(default = "default_include_analysis")]
    pub include_analysis: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendDigestRequest {
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default = "default_include_analysis")]
    pub include_analysis: bool,
}

// ============================================================================
// Handlers
// ============================================================================

fn load(state: &AppState, id: &str) -> Result<EngagementContext, ApiError> {
    state
        .contexts
        .require(&ContextId::from_string(id))
        .map_err(engage_error)
}

fn store(state: &AppState, context: &EngagementContext) -> Result<(), ApiError> {
    state.contexts.save(context).map_err(engage_error)
}

/// Start an engagement session
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSummary>), ApiError> {
    let context = EngagementContext::new();
    store(&state, &context)?;
    tracing::info!(session = %context.id, "Engagement session created");
    Ok((StatusCode::CREATED, Json(SessionSummary::from(&context))))
}

/// Recent engagement sessions, most recently updated first
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let contexts = state.contexts.list(query.limit).map_err(engage_error)?;
    Ok(Json(contexts.iter().map(SessionSummary::from).collect()))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let context = load(&state, &id)?;
    Ok(Json(SessionSummary::from(&context)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let context = load(&state, &id)?;
    state.contexts.delete(&context.id).map_err(engage_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch posts into the session, replacing any earlier fetch
pub async fn fetch_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FetchPostsRequest>,
) -> Result<Json<PostsResponse>, ApiError> {
    let mut context = load(&state, &id)?;

    let subreddits = if payload.subreddits.is_empty() {
        POPULAR_SUBREDDITS[..2].iter().map(ToString::to_string).collect()
    } else {
        payload
            .subreddits
            .iter()
            .map(|s| normalize_subreddit(s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(engage_error)?
    };

    if !(1..=MAX_LIMIT).contains(&payload.limit) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_LIMIT",
            format!("limit must be between 1 and {MAX_LIMIT}"),
        ));
    }

    let posts = state
        .reddit
        .posts_from_subreddits(&subreddits, payload.kind, payload.timeframe, payload.limit)
        .await
        .map_err(engage_error)?;

    tracing::info!(session = %context.id, posts = posts.len(), kind = %payload.kind, "Fetched posts");

    context.set_posts(posts);
    store(&state, &context)?;

    Ok(Json(PostsResponse {
        session_id: context.id.to_string(),
        posts: context.posts().to_vec(),
    }))
}

/// Choose which fetched posts to respond to
pub async fn select_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<SelectResponse>, ApiError> {
    let mut context = load(&state, &id)?;

    if payload.all {
        context.select_all();
    } else {
        context.select(&payload.indices).map_err(engage_error)?;
    }
    store(&state, &context)?;

    Ok(Json(SelectResponse {
        session_id: context.id.to_string(),
        selected: context.selected_indices().to_vec(),
        posts: context.selected_posts(),
    }))
}

/// Draft one response per selected post
pub async fn generate_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResponsesResponse>, ApiError> {
    let mut context = load(&state, &id)?;
    let generation = state
        .generator
        .generate_for(&mut context)
        .await
        .map_err(engage_error)?;
    store(&state, &context)?;

    let responses = generation
        .report
        .iter()
        .filter_map(|entry| {
            let post = context.responded_posts().get(entry.record_index)?;
            Some(SuggestedResponse {
                title: post.title.clone(),
                url: post.url.clone(),
                subreddit: post.subreddit.clone(),
                response: entry.response().to_string(),
                rating: entry.rating().clone(),
                matched_by: entry.kind,
            })
        })
        .collect();

    Ok(Json(ResponsesResponse {
        session_id: context.id.to_string(),
        responses,
        analysis: generation.analysis,
        table_found: generation.report.table_found,
        retried: generation.retried,
    }))
}

/// Preview the digest without sending it
pub async fn preview_digest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DigestQuery>,
) -> Result<Json<Digest>, ApiError> {
    let context = load(&state, &id)?;
    let digest = Digest::from_context(&context, query.include_analysis).map_err(engage_error)?;
    Ok(Json(digest))
}

/// Mail the digest through the remote `send_email` tool
pub async fn send_digest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SendDigestRequest>,
) -> Result<Json<Delivery>, ApiError> {
    let mut context = load(&state, &id)?;

    let delivery = state
        .mailer
        .send_for(
            &mut context,
            &payload.to,
            payload.subject.as_deref(),
            payload.include_analysis,
        )
        .await
        .map_err(engage_error)?;
    store(&state, &context)?;

    Ok(Json(delivery))
}
