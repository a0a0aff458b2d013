// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backfill and ad-hoc query routes.

use crate::error::{AppError, Result};
use crate::services::{query_guard, SyncSummary};
use crate::AppState;
use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Bounds enforced here, in front of the query guard.
const MAX_QUERY_LENGTH: usize = 5000;
const MAX_QUERY_PARAMS: usize = 32;

/// Largest historical span accepted by one backfill call.
const MAX_BACKFILL_DAYS: u32 = 3650;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/backfill", post(backfill))
        .route("/query", post(run_query))
}

// ─── Backfill ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BackfillRequest {
    /// Days of history to sync
    pub total_days: u32,
    /// Days to skip back before the span starts
    #[serde(default)]
    pub offset_days: u32,
    /// Optional subset of resource names
    #[serde(default)]
    pub resources: Option<Vec<String>>,
}

/// Run a sync over the requested span and return the summary.
async fn backfill(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BackfillRequest>,
) -> Result<Json<SyncSummary>> {
    if req.total_days == 0 || req.total_days > MAX_BACKFILL_DAYS {
        return Err(AppError::BadRequest(format!(
            "total_days must be between 1 and {}",
            MAX_BACKFILL_DAYS
        )));
    }

    let summary = state
        .orchestrator
        .sync(req.total_days, req.offset_days, req.resources.as_deref())
        .await;
    Ok(Json(summary))
}

// ─── Ad-hoc Queries ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct QueryRequest {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

/// Validate and execute a read-only query against the store.
async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Vec<serde_json::Value>>> {
    if req.sql.len() > MAX_QUERY_LENGTH {
        return Err(AppError::BadRequest(format!(
            "query exceeds {} characters",
            MAX_QUERY_LENGTH
        )));
    }
    if req.params.len() > MAX_QUERY_PARAMS {
        return Err(AppError::BadRequest(format!(
            "too many parameters (max {})",
            MAX_QUERY_PARAMS
        )));
    }

    query_guard::validate(&req.sql)?;

    let rows = state.store.query(&req.sql, &req.params).await?;
    Ok(Json(rows))
}
