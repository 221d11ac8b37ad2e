pub mod columns;
pub mod edits;
pub mod health;
pub mod query;
pub mod rows;
pub mod transfer;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /columns                                  list, add, replace
/// /columns/editable                         new-row form columns (GET)
/// /columns/{id}/toggle-visibility           flip visibility (POST)
///
/// /rows                                     current page (GET), create (POST)
/// /rows/{id}                                get, merge update (PATCH), delete
/// /rows/{id}/edit                           begin (POST), edit field (PUT), pending (GET)
/// /rows/{id}/edit/commit                    commit pending edit (POST)
/// /rows/{id}/edit/discard                   discard pending edit (POST)
///
/// /edits                                    rows in edit mode (GET)
/// /edits/commit                             commit every edit (POST)
/// /edits/discard                            discard every edit (POST)
///
/// /query                                    get, update (PUT)
/// /query/sort/{column_id}                   toggle sort (POST)
///
/// /import                                   status (GET), import CSV body (POST), reset (DELETE);
///                                           body limit from `ServerConfig::import_max_bytes`
/// /export                                   CSV of the filtered rows (GET)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/columns", columns::router())
        .merge(rows::router())
        .merge(edits::router())
        .nest("/query", query::router())
        .merge(transfer::router(config.import_max_bytes))
}
