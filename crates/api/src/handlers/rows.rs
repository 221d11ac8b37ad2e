//! Handlers for rows and the rendered page.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tabula_core::edit::EditSessions;
use tabula_core::error::CoreError;
use tabula_core::query::{QueryState, PAGE_SIZE_OPTIONS};
use tabula_core::rows::{FieldViolation, Row};
use tabula_core::schema::Column;
use tabula_core::types::FieldMap;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// A row as rendered: committed values plus pending values while editing.
#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: String,
    pub fields: FieldMap,
    pub editing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<FieldMap>,
}

impl RowView {
    pub fn new(row: &Row, edits: &EditSessions) -> Self {
        let pending = edits.pending(&row.id).map(|p| p.fields.clone());
        Self {
            id: row.id.clone(),
            fields: row.fields.clone(),
            editing: pending.is_some(),
            pending,
        }
    }
}

/// The current page with everything needed to draw it.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub columns: Vec<Column>,
    pub rows: Vec<RowView>,
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub page_size_options: [usize; 4],
    pub query: QueryState,
}

/// Result of a rejected new-row form.
#[derive(Debug, Serialize)]
pub struct RowValidationFailure {
    pub status: String,
    pub errors: Vec<FieldViolation>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/rows
///
/// The current page of filtered, sorted rows with counts.
pub async fn list_page(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let view = session.page_view();

    let response = PageResponse {
        columns: session.schema().list_visible().into_iter().cloned().collect(),
        rows: view
            .rows
            .iter()
            .map(|row| RowView::new(row, session.edits()))
            .collect(),
        total_count: view.total_count,
        page_index: view.page_index,
        page_size: view.page_size,
        page_count: view.page_count,
        page_size_options: PAGE_SIZE_OPTIONS,
        query: session.query().clone(),
    };

    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/rows/{id}
pub async fn get_row(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let row = session
        .rows()
        .get(&id)
        .ok_or_else(|| AppError::Core(CoreError::row_not_found(&id)))?;
    Ok(Json(DataResponse {
        data: RowView::new(row, session.edits()),
    }))
}

/// POST /api/v1/rows
///
/// Create a row from the new-row form. Returns 422 with every field
/// violation when the form is not acceptable.
pub async fn create_row(
    State(state): State<AppState>,
    Json(fields): Json<FieldMap>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;

    let errors = session.validate_row_form(&fields);
    if !errors.is_empty() {
        let failure = RowValidationFailure {
            status: "validation_failed".to_string(),
            errors,
        };
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(DataResponse { data: failure }),
        )
            .into_response());
    }

    let row = session.create_row(fields)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: row })).into_response())
}

/// PATCH /api/v1/rows/{id}
///
/// Merge the given fields into the committed row. Unspecified fields are
/// left untouched.
pub async fn update_row(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<FieldMap>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.update_row(&id, fields)?;
    let row = session
        .rows()
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::InternalError(format!("row {id} vanished after update")))?;
    Ok(Json(DataResponse { data: row }))
}

/// DELETE /api/v1/rows/{id}
///
/// Any pending edit for the row is discarded with it.
pub async fn delete_row(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.delete_row(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
