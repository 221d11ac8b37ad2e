//! Route definitions for rows and the current page.
//!
//! ```text
//! GET    /rows              -> list_page
//! POST   /rows              -> create_row
//! GET    /rows/{id}         -> get_row
//! PATCH  /rows/{id}         -> update_row
//! DELETE /rows/{id}         -> delete_row
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::rows;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rows", get(rows::list_page).post(rows::create_row))
        .route(
            "/rows/{id}",
            get(rows::get_row)
                .patch(rows::update_row)
                .delete(rows::delete_row),
        )
}
