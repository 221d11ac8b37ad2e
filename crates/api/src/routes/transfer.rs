//! Route definitions for CSV import and export.
//!
//! ```text
//! GET    /import    -> import_status
//! POST   /import    -> import_csv (raw CSV body)
//! DELETE /import    -> reset_import
//! GET    /export    -> export_csv (?filename=)
//! ```
//!
//! The import body limit replaces axum's 2 MiB default on `/import` only.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::transfer;
use crate::state::AppState;

pub fn router(import_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/import",
            get(transfer::import_status)
                .post(transfer::import_csv)
                .delete(transfer::reset_import)
                .layer(DefaultBodyLimit::max(import_max_bytes)),
        )
        .route("/export", get(transfer::export_csv))
}
