//! Route definitions for the column schema.
//!
//! Mounted at `/columns` by `api_routes()`.
//!
//! ```text
//! GET    /                          -> list_columns
//! POST   /                          -> add_column
//! PUT    /                          -> replace_columns
//! GET    /editable                  -> list_editable_columns
//! POST   /{id}/toggle-visibility    -> toggle_visibility
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::columns;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(columns::list_columns)
                .post(columns::add_column)
                .put(columns::replace_columns),
        )
        .route("/editable", get(columns::list_editable_columns))
        .route("/{id}/toggle-visibility", post(columns::toggle_visibility))
}
