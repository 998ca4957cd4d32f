use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use novelsum_core::SummaryParams;

use crate::error::ApiError;
use crate::models::{ParamsRequest, SessionJson};
use crate::state::AppState;

pub async fn set_params(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ParamsRequest>,
) -> Result<Json<SessionJson>, ApiError> {
    let params = SummaryParams::new(req.max_length, req.ratio)?;
    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or_else(ApiError::session_not_found)?;
    session.set_params(params)?;
    tracing::debug!(session = %id, max_length = params.max_length, ratio = params.ratio, "params updated");
    Ok(Json(SessionJson::from_session(&id, &session)))
}
