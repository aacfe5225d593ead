// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP server implementation.
//!
//! Routes the sync protocol onto [`ServerState`]. Everything under `/v1`
//! passes the bearer check; `/health` is always open.

use std::future::Future;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{debug, warn};

use km_core::{
    DeleteResponse, FilesPage, FilesQuery, HealthResponse, ProjectStatus, PushRequest,
    PushResponse,
};

use crate::error::ApiError;
use crate::state::ServerState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Serve until `shutdown` resolves, then finish in-flight requests.
pub async fn serve(
    listener: TcpListener,
    state: ServerState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/projects/:id", delete(delete_project))
        .route("/projects/:id/sync", post(push))
        .route("/projects/:id/files", get(files))
        .route("/projects/:id/status", get(status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .nest("/v1", api)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn require_bearer(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if !state.authorize(bearer) {
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;
    if response.status().is_client_error() || response.status().is_server_error() {
        warn!(%method, %path, status, duration_ms, "request failed");
    } else {
        debug!(%method, %path, status, duration_ms, "request completed");
    }
    response
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn push(
    State(state): State<ServerState>,
    Path(project_id): Path<String>,
    body: Result<Json<PushRequest>, JsonRejection>,
) -> ApiResult<PushResponse> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(state.push(&project_id, request).await?))
}

async fn files(
    State(state): State<ServerState>,
    Path(project_id): Path<String>,
    query: Result<Query<FilesQuery>, QueryRejection>,
) -> ApiResult<FilesPage> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(state.files_page(&project_id, query).await?))
}

async fn status(
    State(state): State<ServerState>,
    Path(project_id): Path<String>,
) -> ApiResult<ProjectStatus> {
    Ok(Json(state.status(&project_id).await?))
}

async fn delete_project(
    State(state): State<ServerState>,
    Path(project_id): Path<String>,
) -> ApiResult<DeleteResponse> {
    Ok(Json(state.delete_project(&project_id).await?))
}
