//! Handlers for query state: search text, sort and page.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tabula_core::query::SortDirection;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Sort column and direction. A missing `column_id` clears sorting.
#[derive(Debug, Deserialize)]
pub struct SortSpec {
    pub column_id: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Body of `PUT /query`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct QueryUpdate {
    pub search_text: Option<String>,
    pub sort: Option<SortSpec>,
    pub page_size: Option<usize>,
    pub page_index: Option<usize>,
}

/// GET /api/v1/query
pub async fn get_query(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    Ok(Json(DataResponse {
        data: session.query().clone(),
    }))
}

/// PUT /api/v1/query
///
/// Changing the search text or page size moves back to the first page; an
/// explicit `page_index` in the same request is applied afterwards. Nothing
/// changes when any part of the update is rejected.
pub async fn update_query(
    State(state): State<AppState>,
    Json(update): Json<QueryUpdate>,
) -> AppResult<impl IntoResponse> {
    if update.page_size == Some(0) {
        return Err(AppError::BadRequest("page_size must be greater than 0".into()));
    }

    let mut session = state.session.lock().await;
    if let Some(sort) = &update.sort {
        session.set_sort(sort.column_id.as_deref(), sort.direction)?;
    }
    if let Some(text) = update.search_text {
        session.set_search_text(text);
    }
    if let Some(page_size) = update.page_size {
        session.set_page_size(page_size)?;
    }
    if let Some(page_index) = update.page_index {
        session.set_page_index(page_index);
    }

    Ok(Json(DataResponse {
        data: session.query().clone(),
    }))
}

/// POST /api/v1/query/sort/{column_id}
///
/// Ascending on first use, descending when the column is already sorted
/// ascending.
pub async fn toggle_sort(
    State(state): State<AppState>,
    Path(column_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.toggle_sort(&column_id)?;
    Ok(Json(DataResponse {
        data: session.query().clone(),
    }))
}
