use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{CreatedSession, SessionJson};
use crate::state::AppState;

pub async fn create(State(state): State<Arc<AppState>>) -> (StatusCode, Json<CreatedSession>) {
    let session_id = state.create_session();
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionJson>, ApiError> {
    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or_else(ApiError::session_not_found)?;
    session.touch();
    Ok(Json(SessionJson::from_session(&id, &session)))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(ApiError::session_not_found)
}
