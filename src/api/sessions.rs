//! Session lifecycle endpoints
//!
//! Sessions keep the last submitted code server-side so a browser reload
//! can restore it. They are in-memory only and expire after a quiet period.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::Session;

/// Request body for updating a session's code
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCodeRequest {
    pub code: String,
}

/// Create a fresh session
///
/// POST /api/sessions
pub async fn create_session(State(state): State<AppState>) -> Json<Session> {
    Json(state.sessions.create().await)
}

/// Fetch a session by id
///
/// Expired sessions are indistinguishable from unknown ones.
///
/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    state
        .sessions
        .get(&id)
        .await
        .map(Json)
        .ok_or(ApiError::SessionNotFound(id))
}

/// Record the current editor contents on a session
///
/// PUT /api/sessions/:id/code
pub async fn update_session_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCodeRequest>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.set_code(&id, request.code).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// Discard a session
///
/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}
