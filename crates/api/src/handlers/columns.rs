//! Handlers for the column schema.
//!
//! Every schema change is persisted by the session before it is applied.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tabula_core::schema::{Column, NewColumn};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a visibility toggle.
#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub id: String,
    pub visible: bool,
}

/// GET /api/v1/columns
pub async fn list_columns(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let columns: Vec<Column> = session.schema().columns().to_vec();
    Ok(Json(DataResponse { data: columns }))
}

/// GET /api/v1/columns/editable
///
/// Columns shown when creating a new row, in registry order.
pub async fn list_editable_columns(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let columns: Vec<Column> = session.new_row_form().into_iter().cloned().collect();
    Ok(Json(DataResponse { data: columns }))
}

/// POST /api/v1/columns
///
/// The id is normalized (lower-cased, whitespace runs become `_`) before the
/// uniqueness check.
pub async fn add_column(
    State(state): State<AppState>,
    Json(input): Json<NewColumn>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    let column = session.add_column(input)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: column })))
}

/// PUT /api/v1/columns
///
/// Replace the whole column list.
pub async fn replace_columns(
    State(state): State<AppState>,
    Json(columns): Json<Vec<Column>>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.set_columns(columns)?;
    let columns: Vec<Column> = session.schema().columns().to_vec();
    Ok(Json(DataResponse { data: columns }))
}

/// POST /api/v1/columns/{id}/toggle-visibility
pub async fn toggle_visibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    let visible = session.toggle_visibility(&id)?;
    Ok(Json(DataResponse {
        data: VisibilityResponse { id, visible },
    }))
}
