// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No usable credential; interactive authorization required")]
    CredentialMissing,

    #[error("Unknown or already-used authorization state")]
    InvalidState,

    #[error("Authorization state expired")]
    ExpiredState,

    #[error("Oura API error for {resource}: HTTP {status}: {body}")]
    RemoteFetch {
        resource: String,
        status: u16,
        body: String,
    },

    #[error("Oura API error: {0}")]
    RemoteApi(String),

    #[error("Query rejected: {0}")]
    NotReadOnly(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::CredentialMissing => (
                StatusCode::UNAUTHORIZED,
                "credential_missing",
                Some("connect an account via /auth/authorize".to_string()),
            ),
            AppError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state", None),
            AppError::ExpiredState => (StatusCode::BAD_REQUEST, "expired_state", None),
            AppError::RemoteFetch { .. } => {
                (StatusCode::BAD_GATEWAY, "oura_error", Some(self.to_string()))
            }
            AppError::RemoteApi(msg) => (StatusCode::BAD_GATEWAY, "oura_error", Some(msg.clone())),
            AppError::NotReadOnly(msg) => {
                (StatusCode::FORBIDDEN, "not_read_only", Some(msg.clone()))
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
