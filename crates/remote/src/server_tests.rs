// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use km_core::FileStore;

use crate::server::router;
use crate::state::ServerState;

fn app(api_key: Option<&str>) -> Router {
    let store = FileStore::open_in_memory().unwrap();
    router(ServerState::with_store(store, api_key.map(String::from)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(path: &str, content_b64: &str) -> Value {
    json!({
        "path": path,
        "checksum": format!("sum-{path}"),
        "modified": 1000,
        "size": 5,
        "content": content_b64,
    })
}

#[tokio::test]
async fn test_health() {
    let app = app(Some("secret"));
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_v1_requires_bearer_when_key_set() {
    let app = app(Some("secret"));

    let (status, body) = send(&app, get("/v1/projects/p1/status")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("bearer"));

    let wrong = Request::get("/v1/projects/p1/status")
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.0, StatusCode::UNAUTHORIZED);

    let right = Request::get("/v1/projects/p1/status")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, right).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"lastSync": null, "fileCount": 0}));
}

#[tokio::test]
async fn test_v1_open_without_key() {
    let app = app(None);
    let (status, _) = send(&app, get("/v1/projects/p1/status")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_push_and_pull_round_trip() {
    let app = app(None);

    let push = json!({
        "files": [upload("docs/a.md", "aGVsbG8=")],
        "deletions": [],
        "metadata": {"client": "test"},
    });
    let (status, body) = send(&app, post_json("/v1/projects/p1/sync", push)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"synced": 1, "deleted": 0, "conflicts": []}));

    let (status, body) = send(&app, get("/v1/projects/p1/files?since=0&limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasMore"], false);
    let file = &body["files"][0];
    assert_eq!(file["path"], "docs/a.md");
    assert_eq!(file["content"], "aGVsbG8=");
    assert_eq!(file["checksum"], "sum-docs/a.md");
    assert!(file["syncedAt"].as_i64().unwrap() > 0);

    let since = file["syncedAt"].as_i64().unwrap();
    let (_, body) = send(&app, get(&format!("/v1/projects/p1/files?since={since}"))).await;
    assert_eq!(body["files"], json!([]));
}

#[tokio::test]
async fn test_files_defaults_without_query() {
    let app = app(None);
    let (status, body) = send(&app, get("/v1/projects/p1/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"files": [], "hasMore": false}));
}

#[tokio::test]
async fn test_bad_base64_is_400() {
    let app = app(None);
    let push = json!({"files": [upload("a.txt", "!!!")], "deletions": []});
    let (status, body) = send(&app, post_json("/v1/projects/p1/sync", push)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("a.txt"));

    let (_, body) = send(&app, get("/v1/projects/p1/status")).await;
    assert_eq!(body["fileCount"], 0);
}

#[tokio::test]
async fn test_empty_path_is_400() {
    let app = app(None);
    let push = json!({"files": [upload("", "aGVsbG8=")]});
    let (status, body) = send(&app, post_json("/v1/projects/p1/sync", push)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = app(None);
    let request = Request::post("/v1/projects/p1/sync")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_bad_query_is_400() {
    let app = app(None);
    let (status, body) = send(&app, get("/v1/projects/p1/files?since=yesterday")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_delete_project() {
    let app = app(None);
    let push = json!({"files": [upload("a", "YQ=="), upload("b", "Yg==")]});
    send(&app, post_json("/v1/projects/p1/sync", push)).await;

    let request = Request::delete("/v1/projects/p1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": 2}));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = app(None);
    let (status, _) = send(&app, get("/v2/whatever")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
