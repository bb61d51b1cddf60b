//! HTTP/WebSocket Handlers

use axum::{
    Json,
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use agent_core::{
    AgentError, GenerationOptions, Session, SessionId,
    provider::ModelInfo,
    reasoning::{Agent, AgentConfig},
};
use reddit_engage::{EngageError, prompt, reddit::expand_post_link};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider_connected: bool,
    pub reddit_client: String,
    pub tools: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

pub const fn default_list_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub model: Option<String>,
    pub messages: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for ConversationSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            title: session.title(),
            model: session.model.clone(),
            messages: session.message_count(),
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

pub fn agent_error(e: &AgentError) -> ApiError {
    tracing::error!("Agent error: {}", e);
    let status = match e {
        AgentError::Provider(_) | AgentError::Toolkit(_) => StatusCode::BAD_GATEWAY,
        AgentError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, "AGENT_ERROR", e.user_message())
}

pub fn engage_error(e: EngageError) -> ApiError {
    if e.is_not_found() {
        return api_error(StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string());
    }
    match e {
        EngageError::InvalidSelection(_) => api_error(StatusCode::BAD_REQUEST, "INVALID_SELECTION", e.to_string()),
        EngageError::InvalidRecipient(_) => api_error(StatusCode::BAD_REQUEST, "INVALID_RECIPIENT", e.to_string()),
        EngageError::Empty(_) => api_error(StatusCode::CONFLICT, "NOTHING_TO_DO", e.to_string()),
        EngageError::Agent(inner) => agent_error(&inner),
        EngageError::Network(_) | EngageError::Status { .. } | EngageError::InvalidResponse(_) => {
            tracing::warn!("Reddit error: {}", e);
            api_error(StatusCode::BAD_GATEWAY, "REDDIT_ERROR", e.to_string())
        }
        other => {
            tracing::error!("Engagement error: {}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", other.to_string())
        }
    }
}

fn generation_for(state: &AppState, model: Option<String>) -> GenerationOptions {
    match model.filter(|m| !m.trim().is_empty()) {
        Some(model) => GenerationOptions {
            model,
            ..state.generation.clone()
        },
        None => state.generation.clone(),
    }
}

/// Load the conversation named by `id`, or start one
fn open_session(state: &AppState, id: Option<&str>, system_prompt: String) -> Result<Session, AgentError> {
    let mut session = match id {
        Some(id) => {
            let id = SessionId::from_string(id);
            state
                .sessions
                .load(&id)?
                .unwrap_or_else(|| Session::with_id(id))
        }
        None => Session::new(),
    };

    if session.conversation.is_empty() {
        session.conversation.push(agent_core::Message::system(system_prompt));
    }
    Ok(session)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider_connected,
        reddit_client: state.reddit.name().to_string(),
        tools: state.tools.len(),
    })
}

/// Models offered by the configured provider
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, ApiError> {
    let models = state.provider.list_models().await.map_err(|e| agent_error(&e))?;

    Ok(Json(ModelsResponse {
        models,
        default: state.generation.model.clone(),
    }))
}

/// Chat with the engagement assistant (non-streaming)
///
/// Passing back `conversation_id` continues the same conversation.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message is empty"));
    }

    let generation = generation_for(&state, payload.model);
    let model = generation.model.clone();

    let agent = Agent::new(
        state.provider.clone(),
        state.tools.clone(),
        AgentConfig {
            system_prompt: prompt::ASSISTANT_PROMPT.into(),
            generation,
            ..Default::default()
        },
    );

    let mut session = open_session(&state, payload.conversation_id.as_deref(), agent.build_system_prompt())
        .map_err(|e| agent_error(&e))?;

    let input = expand_post_link(state.reddit.as_ref(), &payload.message).await;
    session.conversation.push(agent_core::Message::user(input));

    let response = agent
        .run(&mut session.conversation)
        .await
        .map_err(|e| agent_error(&e))?;

    session.model = Some(model.clone());
    session.touch();
    state.sessions.save(&session).map_err(|e| agent_error(&e))?;

    Ok(Json(ChatResponse {
        message: response,
        conversation_id: session.id.to_string(),
        model,
    }))
}

/// Recent conversations, most recently active first
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let sessions = state.sessions.list(query.limit).map_err(|e| agent_error(&e))?;
    Ok(Json(sessions.iter().map(ConversationSummary::from).collect()))
}

/// WebSocket streaming chat
pub async fn chat_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

fn error_frame(error: impl std::fmt::Display) -> Message {
    let error = serde_json::json!({"type": "error", "error": error.to_string()});
    Message::Text(error.to_string().into())
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let request: ChatRequest = match serde_json::from_str(&msg) {
            Ok(r) => r,
            Err(e) => {
                let _ = sender.send(error_frame(e)).await;
                continue;
            }
        };

        let options = generation_for(&state, request.model);
        let mut session = match open_session(
            &state,
            request.conversation_id.as_deref(),
            prompt::ASSISTANT_PROMPT.to_string(),
        ) {
            Ok(session) => session,
            Err(e) => {
                let _ = sender.send(error_frame(e.user_message())).await;
                continue;
            }
        };

        let input = expand_post_link(state.reddit.as_ref(), &request.message).await;
        session.conversation.push(agent_core::Message::user(input));
        let conversation_id = session.id.to_string();

        let mut stream = match state.provider.complete_stream(session.conversation.messages(), &options).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = sender.send(error_frame(e.user_message())).await;
                continue;
            }
        };

        let mut reply = String::new();
        let mut completed = false;
        while let Some(result) = stream.next().await {
            match result {
                Ok(chunk) => {
                    reply.push_str(&chunk.delta);
                    completed |= chunk.done;
                    let response = serde_json::json!({
                        "type": "chunk",
                        "content": chunk.delta,
                        "done": chunk.done,
                        "conversation_id": conversation_id,
                    });
                    if sender.send(Message::Text(response.to_string().into())).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    let _ = sender.send(error_frame(e.user_message())).await;
                    break;
                }
            }
        }

        if completed {
            session.conversation.push(agent_core::Message::assistant(reply));
            session.model = Some(options.model);
            session.touch();
            if let Err(e) = state.sessions.save(&session) {
                tracing::warn!("Failed to save conversation {}: {}", conversation_id, e);
            }
        }
    }
}
