// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use km_core::ErrorBody;
use thiserror::Error;

/// Errors returned by request handlers, rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("storage error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<km_core::Error> for ApiError {
    fn from(e: km_core::Error) -> Self {
        match e {
            km_core::Error::InvalidProjectId(_)
            | km_core::Error::InvalidPath(_)
            | km_core::Error::InvalidContent { .. } => ApiError::BadRequest(e.to_string()),
            other => {
                tracing::error!(error = %other, "store operation failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
