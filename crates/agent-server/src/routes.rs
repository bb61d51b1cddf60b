//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::engage::{
    create_session, delete_session, fetch_posts, generate_responses, get_session, list_sessions,
    preview_digest, select_posts, send_digest,
};
use crate::handlers::{
    chat_handler, chat_stream_handler, health_check, list_conversations, list_models,
};
use crate::research::{run_research, search_jobs};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        // Assistant chat
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        .route("/api/chat/conversations", get(list_conversations))
        // Engagement workflow
        .route("/api/engage/sessions", get(list_sessions).post(create_session))
        .route("/api/engage/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/engage/sessions/{id}/posts", post(fetch_posts))
        .route("/api/engage/sessions/{id}/select", post(select_posts))
        .route("/api/engage/sessions/{id}/responses", post(generate_responses))
        .route("/api/engage/sessions/{id}/digest", get(preview_digest).post(send_digest))
        // Research agents
        .route("/api/jobs", post(search_jobs))
        .route("/api/research", post(run_research))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
