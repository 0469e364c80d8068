//! HTTP API server for integration with other systems.
//!
//! Exposes the question-answering pipeline over a small REST surface.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::TubetalkError;
use crate::service::VideoChat;
use crate::session::SessionInfo;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    chat: VideoChat,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let chat = VideoChat::new(settings)?;
    let state = Arc::new(AppState { chat });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat_endpoint))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{video_id}", delete(evict_session))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tubetalk API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Chat", "POST   /chat");
    Output::kv("Sessions", "GET    /sessions");
    Output::kv("Evict", "DELETE /sessions/:video_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    /// YouTube URL or video ID
    video_id: String,
    /// The question to ask
    query: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionInfo>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Map a pipeline error to an HTTP status.
fn status_for(error: &TubetalkError) -> StatusCode {
    match error {
        TubetalkError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
        TubetalkError::TranscriptUnavailable | TubetalkError::VideoUnavailable => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat_endpoint(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    info!("Received question for video {}", req.video_id);

    match state.chat.answer_for(&req.video_id, &req.query).await {
        Ok(answer) => Json(ChatResponse { answer }).into_response(),
        Err(e) => (
            status_for(&e),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.chat.sessions().await;
    Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    })
}

async fn evict_session(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    match state.chat.evict(&video_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No active session for video: {}", video_id),
            }),
        )
            .into_response(),
        Err(e) => (
            status_for(&e),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
