//! Reddit engagement HTTP server
//!
//! Axum-based server providing the assistant chat (REST and WebSocket) and
//! the engagement workflow: fetch posts, select, generate responses, mail a
//! digest.

mod engage;
mod handlers;
mod research;
mod routes;
mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let state = AppState::from_env().await?;
    if !state.mailer.has_email_tool() {
        tracing::warn!("⚠ No send_email tool - digests cannot be mailed");
        tracing::warn!("  Set TOOLHOUSE_API_KEY in .env to enable remote tools");
    }

    let app = routes::router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 reddit-engage server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                              - Health check");
    tracing::info!("  GET  /api/models                          - List available models");
    tracing::info!("  POST /api/chat                           - Send message");
    tracing::info!("  GET  /api/chat/stream                     - WebSocket streaming");
    tracing::info!("  GET  /api/chat/conversations              - Recent conversations");
    tracing::info!("  GET  /api/engage/sessions                 - Recent engagement sessions");
    tracing::info!("  POST /api/engage/sessions                 - Start engagement session");
    tracing::info!("  POST /api/engage/sessions/{{id}}/posts      - Fetch posts");
    tracing::info!("  POST /api/engage/sessions/{{id}}/select     - Select posts");
    tracing::info!("  POST /api/engage/sessions/{{id}}/responses  - Generate responses");
    tracing::info!("  GET  /api/engage/sessions/{{id}}/digest     - Preview digest");
    tracing::info!("  POST /api/engage/sessions/{{id}}/digest     - Send digest");
    tracing::info!("  POST /api/jobs                            - Search job openings");
    tracing::info!("  POST /api/research                        - Company due diligence");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
