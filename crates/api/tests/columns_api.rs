//! HTTP-level tests for the column schema endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_test_app_in, get, post_empty, post_json, put_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_default_columns_in_order() {
    let app = build_test_app();
    let json = body_json(get(&app, "/api/v1/columns").await).await;

    let ids: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["name", "email", "age", "role", "department", "location"]);
    assert_eq!(json["data"][2]["type"], "number");
    assert_eq!(json["data"][1]["type"], "email");
}

#[tokio::test]
async fn editable_columns_follow_registry_order() {
    let app = build_test_app();
    let json = body_json(get(&app, "/api/v1/columns/editable").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 6);
    assert_eq!(json["data"][0]["id"], "name");
}

// ---------------------------------------------------------------------------
// Adding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_column_normalizes_id() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/v1/columns",
        json!({ "id": "Start Date", "label": "Start Date" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], "start_date");
    assert_eq!(json["data"]["type"], "text");
    assert_eq!(json["data"]["visible"], true);

    let list = body_json(get(&app, "/api/v1/columns").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn duplicate_column_is_conflict() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/v1/columns",
        json!({ "id": "email", "label": "Email again", "type": "email" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "DUPLICATE_COLUMN");
}

#[tokio::test]
async fn empty_label_is_rejected() {
    let app = build_test_app();
    let response = post_json(&app, "/api/v1/columns", json!({ "id": "x", "label": "" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_COLUMN");
}

// ---------------------------------------------------------------------------
// Visibility and replacement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_visibility_flips_and_hides_from_page() {
    let app = build_test_app();
    let response = post_empty(&app, "/api/v1/columns/email/toggle-visibility").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"], json!({ "id": "email", "visible": false }));

    let page = body_json(get(&app, "/api/v1/rows").await).await;
    let shown: Vec<&str> = page["data"]["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert!(!shown.contains(&"email"));

    let json = body_json(post_empty(&app, "/api/v1/columns/email/toggle-visibility").await).await;
    assert_eq!(json["data"]["visible"], true);
}

#[tokio::test]
async fn toggle_unknown_column_is_404() {
    let app = build_test_app();
    let response = post_empty(&app, "/api/v1/columns/nope/toggle-visibility").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replace_columns_rejects_duplicates_without_change() {
    let app = build_test_app();
    let column = json!({
        "id": "name", "label": "Name", "type": "text",
        "visible": true, "sortable": true, "editable": true
    });
    let response = put_json(&app, "/api/v1/columns", json!([column, column])).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let list = body_json(get(&app, "/api/v1/columns").await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn replace_columns_reorders_and_relabels() {
    let app = build_test_app();
    let mut columns = body_json(get(&app, "/api/v1/columns").await).await["data"].clone();
    let list = columns.as_array_mut().unwrap();
    list.reverse();
    list[0]["label"] = json!("City");

    let response = put_json(&app, "/api/v1/columns", columns).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], "location");
    assert_eq!(json["data"][0]["label"], "City");
    assert_eq!(json["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn replace_columns_rejects_unnormalized_or_blank_columns() {
    let app = build_test_app();
    let mut columns = body_json(get(&app, "/api/v1/columns").await).await["data"].clone();
    let list = columns.as_array_mut().unwrap();
    let mut extra = list[0].clone();
    extra["id"] = json!("Start Date");
    extra["label"] = json!("");
    list.push(extra);

    let response = put_json(&app, "/api/v1/columns", columns.clone()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_COLUMN");

    let list = columns.as_array_mut().unwrap();
    let last = list.last_mut().unwrap();
    last["id"] = json!("");
    last["label"] = json!("Blank");
    let response = put_json(&app, "/api/v1/columns", columns).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let current = body_json(get(&app, "/api/v1/columns").await).await;
    assert_eq!(current["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn replace_columns_cannot_rename_existing_ids() {
    let app = build_test_app();
    let mut columns = body_json(get(&app, "/api/v1/columns").await).await["data"].clone();
    columns[0]["id"] = json!("full_name");

    let response = put_json(&app, "/api/v1/columns", columns).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let current = body_json(get(&app, "/api/v1/columns").await).await;
    assert_eq!(current["data"][0]["id"], "name");
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn schema_survives_restart_with_file_store() {
    let dir = tempfile::tempdir().unwrap();

    let app = build_test_app_in(dir.path());
    let response = post_json(
        &app,
        "/api/v1/columns",
        json!({ "id": "salary", "label": "Salary", "type": "number" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    drop(app);

    let restarted = build_test_app_in(dir.path());
    let list = body_json(get(&restarted, "/api/v1/columns").await).await;
    let last = list["data"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["id"], "salary");
    assert_eq!(last["type"], "number");
}
