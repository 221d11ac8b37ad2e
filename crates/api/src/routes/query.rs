//! Route definitions for query state.
//!
//! Mounted at `/query` by `api_routes()`.
//!
//! ```text
//! GET    /                      -> get_query
//! PUT    /                      -> update_query
//! POST   /sort/{column_id}      -> toggle_sort
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::query;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(query::get_query).put(query::update_query))
        .route("/sort/{column_id}", post(query::toggle_sort))
}
