// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth authorization routes.

use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/authorize", get(auth_start))
        .route("/auth/callback", get(auth_callback))
}

/// Start the OAuth flow - redirect to the provider's authorization page.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let auth_url = state.credentials.start_authorization().await?;
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct CallbackResponse {
    pub status: String,
}

/// OAuth callback - exchange the code for tokens and store them.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from provider");
        return Err(AppError::BadRequest(format!("authorization denied: {}", error)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing code".to_string()))?;
    let oauth_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("missing state".to_string()))?;

    state
        .credentials
        .complete_authorization(&code, &oauth_state)
        .await?;

    Ok(Json(CallbackResponse {
        status: "connected".to_string(),
    }))
}
