//! Handlers for inline edit sessions.
//!
//! A row is in edit mode while it has a pending copy of its fields. Field
//! edits touch only that copy until it is committed.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tabula_core::edit::PendingEdit;
use tabula_core::error::CoreError;
use tabula_core::types::CellValue;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `PUT /rows/{id}/edit`.
///
/// Exactly one of `value` (stored as given) or `input` (raw text converted
/// by the column's data type) must be set.
#[derive(Debug, Deserialize)]
pub struct EditFieldRequest {
    pub column_id: String,
    pub value: Option<CellValue>,
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DiscardResponse {
    pub discarded: bool,
}

#[derive(Debug, Serialize)]
pub struct DiscardAllResponse {
    pub discarded: usize,
}

/// GET /api/v1/rows/{id}/edit
pub async fn get_pending(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let pending = session
        .edits()
        .pending(&id)
        .cloned()
        .ok_or_else(|| AppError::Core(CoreError::NotInEdit(id.clone())))?;
    Ok(Json(DataResponse { data: pending }))
}

/// POST /api/v1/rows/{id}/edit
///
/// Enter edit mode. Repeating the call keeps the existing pending values.
pub async fn begin_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.begin_edit(&id)?;
    let pending: Option<PendingEdit> = session.edits().pending(&id).cloned();
    Ok(Json(DataResponse { data: pending }))
}

/// PUT /api/v1/rows/{id}/edit
pub async fn edit_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EditFieldRequest>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    match (input.value, input.input) {
        (Some(value), None) => session.edit_field(&id, &input.column_id, value)?,
        (None, Some(raw)) => session.edit_field_input(&id, &input.column_id, &raw)?,
        _ => {
            return Err(AppError::BadRequest(
                "exactly one of 'value' or 'input' is required".into(),
            ))
        }
    }
    let pending: Option<PendingEdit> = session.edits().pending(&id).cloned();
    Ok(Json(DataResponse { data: pending }))
}

/// POST /api/v1/rows/{id}/edit/commit
///
/// Write the pending values into the row and leave edit mode.
pub async fn commit_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.commit_edit(&id)?;
    let row = session.rows().get(&id).cloned();
    Ok(Json(DataResponse { data: row }))
}

/// POST /api/v1/rows/{id}/edit/discard
pub async fn discard_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    let discarded = session.discard_edit(&id);
    Ok(Json(DataResponse {
        data: DiscardResponse { discarded },
    }))
}

/// GET /api/v1/edits
pub async fn list_editing(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let ids: Vec<String> = session
        .edits()
        .editing_ids()
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(Json(DataResponse { data: ids }))
}

/// POST /api/v1/edits/commit
///
/// Succeeds with an empty summary when nothing is being edited.
pub async fn commit_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    let summary = session.commit_all();
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/edits/discard
pub async fn discard_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    let discarded = session.discard_all();
    Ok(Json(DataResponse {
        data: DiscardAllResponse { discarded },
    }))
}
