//! Route definitions for inline edit sessions.
//!
//! ```text
//! GET    /rows/{id}/edit            -> get_pending
//! POST   /rows/{id}/edit            -> begin_edit
//! PUT    /rows/{id}/edit            -> edit_field
//! POST   /rows/{id}/edit/commit     -> commit_edit
//! POST   /rows/{id}/edit/discard    -> discard_edit
//! GET    /edits                     -> list_editing
//! POST   /edits/commit              -> commit_all
//! POST   /edits/discard             -> discard_all
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::edits;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rows/{id}/edit",
            get(edits::get_pending)
                .post(edits::begin_edit)
                .put(edits::edit_field),
        )
        .route("/rows/{id}/edit/commit", post(edits::commit_edit))
        .route("/rows/{id}/edit/discard", post(edits::discard_edit))
        .route("/edits", get(edits::list_editing))
        .route("/edits/commit", post(edits::commit_all))
        .route("/edits/discard", post(edits::discard_all))
}
