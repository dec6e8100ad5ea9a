use super::state::AppState;
use crate::error::{HistoryError, PersistenceError};
use crate::history::{Conversation, HistoryStats, Message, SessionSummary};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,

    /// Conversation key to continue (new conversation if omitted)
    pub session_id: Option<String>,

    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: Message,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn history_error(e: HistoryError) -> Response {
    let status = match &e {
        HistoryError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        HistoryError::EmptyMessage => StatusCode::BAD_REQUEST,
        HistoryError::Persistence(PersistenceError::PartialDelete { .. }) => StatusCode::CONFLICT,
        HistoryError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /users/:user_id/sessions
/// List conversation sessions, most recent first
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let mut history = state.history(&user_id);

    match history.refresh().await {
        Ok(sessions) => {
            let summaries: Vec<SessionSummary> = sessions.iter().map(SessionSummary::from).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(e) => {
            error!("Failed to load history for {}: {}", user_id, e);
            history_error(e)
        }
    }
}

/// GET /users/:user_id/sessions/:session_id
/// Messages of one session
pub async fn get_session(
    State(state): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut history = state.history(&user_id);

    if let Err(e) = history.refresh().await {
        error!("Failed to load history for {}: {}", user_id, e);
        return history_error(e);
    }

    match history.find(&session_id) {
        Some(session) => (StatusCode::OK, Json(session.messages.clone())).into_response(),
        None => history_error(HistoryError::SessionNotFound(session_id)),
    }
}

/// DELETE /users/:user_id/sessions/:session_id
/// Delete every message of one session
pub async fn delete_session(
    State(state): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut history = state.history(&user_id);

    let result = match history.refresh().await {
        Ok(_) => history.delete_session(&session_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!("Deleted session {} for {}", session_id, user_id);
            (
                StatusCode::OK,
                Json(DeleteResponse {
                    status: "deleted".to_string(),
                    message: format!("Conversation {} deleted", session_id),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to delete session {}: {}", session_id, e);
            history_error(e)
        }
    }
}

/// DELETE /users/:user_id/history
/// Clear all chat history of one user
pub async fn clear_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let mut history = state.history(&user_id);

    match history.clear().await {
        Ok(count) => (
            StatusCode::OK,
            Json(DeleteResponse {
                status: "cleared".to_string(),
                message: format!("{} messages deleted", count),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to clear history for {}: {}", user_id, e);
            history_error(e)
        }
    }
}

/// GET /users/:user_id/stats
/// Conversation counts for the history header
pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let mut history = state.history(&user_id);

    match history.refresh().await {
        Ok(_) => {
            let stats: HistoryStats = history.stats();
            (StatusCode::OK, Json(stats)).into_response()
        }
        Err(e) => history_error(e),
    }
}

/// POST /chat
/// Send one message and get the assistant's reply
pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    let mut conversation = match req.session_id.as_deref() {
        Some(key) => resume_conversation(&state, &req.user_id, key).await,
        None => Conversation::start(Arc::clone(&state.store), &req.user_id),
    };

    match conversation.send(&req.message, state.replies.as_ref()).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ChatResponse {
                session_id: conversation.session_key().to_string(),
                reply,
            }),
        )
            .into_response(),
        Err(e) => history_error(e),
    }
}

/// Accept either a listed session id or a stored conversation key
async fn resume_conversation(state: &AppState, user_id: &str, key: &str) -> Conversation {
    let mut history = state.history(user_id);
    match history.refresh().await {
        Ok(_) => {
            if let Some(conversation) = history
                .find(key)
                .and_then(|session| Conversation::from_session(Arc::clone(&state.store), session))
            {
                return conversation;
            }
        }
        Err(e) => warn!("Error loading history for {}: {}", user_id, e),
    }

    Conversation::resume(Arc::clone(&state.store), user_id, key).await
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
