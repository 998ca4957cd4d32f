use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use std::sync::Arc;

use novelsum_core::{ExtractedText, extract_text_from_bytes};

use crate::error::ApiError;
use crate::models::SessionJson;
use crate::state::AppState;
use crate::upload;

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SessionJson>, ApiError> {
    if !state.sessions.contains_key(&id) {
        return Err(ApiError::session_not_found());
    }

    let result = extract_upload(&state, multipart).await;

    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or_else(ApiError::session_not_found)?;
    match result {
        Ok(document) => {
            let filename = document.filename.clone();
            let new_state = session.upload(document).name();
            tracing::info!(session = %id, filename = %filename, state = new_state, "document uploaded");
            Ok(Json(SessionJson::from_session(&id, &session)))
        }
        Err(e) => {
            // A rejected file still replaces whatever was loaded before
            session.clear();
            tracing::info!(session = %id, "upload rejected, session reset");
            Err(e)
        }
    }
}

async fn extract_upload(
    state: &AppState,
    multipart: Multipart,
) -> Result<ExtractedText, ApiError> {
    let file = upload::parse_multipart(multipart)
        .await
        .map_err(ApiError::bad_request)?;
    let filename = file.filename.clone();

    // Extraction is blocking I/O via MuPDF
    let backend = state.pdf_backend.clone();
    tokio::task::spawn_blocking(move || {
        extract_text_from_bytes(&file.filename, &file.data, backend.as_ref())
    })
    .await
    .map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Extraction task error: {}", e),
        )
    })?
    .map_err(|e| {
        tracing::warn!(filename = %filename, error = %e, "extraction failed");
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, format!("{}: {}", filename, e))
    })
}
