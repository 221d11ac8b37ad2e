//! Handlers for CSV import and export.
//!
//! Import parsing and validation run on a blocking task against a snapshot
//! of the schema, without holding the session lock. The row store is only
//! touched when the finished batch is applied.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tabula_core::importer::{
    prepare_import, ImportBatch, ImportError, ImportOutcome, ImportPhase, ImportTicket,
};
use tabula_core::session::TableSession;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Import ticket guard
// ---------------------------------------------------------------------------

/// Owns an import ticket between `start_import` and `finish_import`.
///
/// If the request future is dropped first (client gone, request timeout) the
/// ticket is abandoned on a spawned task so the importer leaves `Parsing`.
struct ImportGuard {
    session: Arc<Mutex<TableSession>>,
    ticket: Option<ImportTicket>,
}

impl ImportGuard {
    fn new(session: Arc<Mutex<TableSession>>, ticket: ImportTicket) -> Self {
        Self {
            session,
            ticket: Some(ticket),
        }
    }

    /// Hand the ticket back for `finish_import`. Call only while holding the
    /// session lock, so nothing can be cancelled in between.
    fn disarm(mut self) -> Option<ImportTicket> {
        self.ticket.take()
    }
}

impl Drop for ImportGuard {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        let session = Arc::clone(&self.session);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    session.lock().await.abandon_import(ticket);
                    tracing::debug!("Unfinished CSV import abandoned");
                });
            }
            Err(_) => tracing::warn!("No runtime to abandon unfinished CSV import"),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Importer phase plus the errors of the last rejected file.
#[derive(Debug, Serialize)]
pub struct ImportStatus {
    pub phase: ImportPhase,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub filename: Option<String>,
}

/// GET /api/v1/import
pub async fn import_status(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.session.lock().await;
    let importer = session.importer();
    Ok(Json(DataResponse {
        data: ImportStatus {
            phase: importer.phase(),
            errors: importer.last_errors().to_vec(),
        },
    }))
}

/// POST /api/v1/import
///
/// The body is the raw CSV file. Responds 200 when the row store was
/// replaced and 422 with every violation when it was not. A body over the
/// configured size limit is rejected as a whole-file error with 413.
pub async fn import_csv(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<impl IntoResponse> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let limit = state.config.import_max_bytes;
            tracing::warn!(limit, "CSV import body over size limit");
            let error = ImportError::file(format!(
                "File is larger than the import limit of {limit} bytes"
            ));
            let mut session = state.session.lock().await;
            let (ticket, _) = session.start_import();
            let outcome = session.finish_import(ticket, ImportBatch::Invalid(vec![error]))?;
            return Ok((StatusCode::PAYLOAD_TOO_LARGE, Json(DataResponse { data: outcome })));
        }
        Err(rejection) => return Err(AppError::BadRequest(rejection.body_text())),
    };

    let (ticket, schema) = state.session.lock().await.start_import();
    let guard = ImportGuard::new(Arc::clone(&state.session), ticket);
    tracing::debug!(bytes = body.len(), "CSV import started");

    let batch = tokio::task::spawn_blocking(move || prepare_import(&body, &schema))
        .await
        .map_err(|e| AppError::InternalError(format!("CSV import task failed: {e}")))?;

    let mut session = state.session.lock().await;
    let ticket = guard
        .disarm()
        .ok_or_else(|| AppError::InternalError("CSV import ticket already released".into()))?;
    let outcome = session.finish_import(ticket, batch)?;
    let status = match outcome {
        ImportOutcome::Committed { .. } => StatusCode::OK,
        ImportOutcome::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Ok((status, Json(DataResponse { data: outcome })))
}

/// DELETE /api/v1/import
///
/// Acknowledge the last result and return the importer to idle. An import
/// that never finished is abandoned.
pub async fn reset_import(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.reset_import();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/export
///
/// Every filtered row (all pages, in view order) over the visible columns,
/// as a CSV attachment.
pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let filename = params
        .filename
        .unwrap_or_else(|| state.config.export_filename.clone());
    if filename.is_empty() || filename.contains(['"', '/', '\\', '\r', '\n']) {
        return Err(AppError::BadRequest(format!("invalid export filename '{filename}'")));
    }

    let document = state.session.lock().await.export(Some(&filename));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.content,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
