// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP surface validation tests: request bounds and query guarding.

mod common;

use common::{engine_with_config, serve};
use oura_sync::config::Config;
use oura_sync::{routes, AppState};
use serde_json::json;
use std::sync::Arc;

/// Serve the real router backed by an in-memory engine. The API base
/// points nowhere, so backfills see an empty catalog.
async fn serve_app() -> String {
    let config = Config::default();
    let e = engine_with_config(Config {
        oura_api_base: "http://127.0.0.1:9".to_string(),
        ..config.clone()
    });

    let state = Arc::new(AppState {
        config,
        store: e.store.clone(),
        credentials: e.credentials,
        orchestrator: e.orchestrator,
    });
    serve(routes::create_router(state)).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = serve_app().await;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_backfill_rejects_zero_days() {
    let base = serve_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/backfill", base))
        .json(&json!({"total_days": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_backfill_with_empty_catalog_reports_nothing() {
    let base = serve_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/backfill", base))
        .json(&json!({"total_days": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let summary: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(summary["successful"], 0);
    assert_eq!(summary["failed"], 0);
}

#[tokio::test]
async fn test_query_rejects_mutations() {
    let base = serve_app().await;
    let client = reqwest::Client::new();

    for sql in [
        "DROP TABLE daily_summaries",
        "SELECT 1; DROP TABLE x",
        "SELECT * FROM oauth_tokens",
    ] {
        let resp = client
            .post(format!("{}/query", base))
            .json(&json!({"sql": sql}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403, "expected rejection for: {}", sql);
    }
}

#[tokio::test]
async fn test_query_bounds_enforced_before_validation() {
    let base = serve_app().await;
    let client = reqwest::Client::new();

    let long_sql = format!("SELECT * FROM daily_summaries -- {}", "x".repeat(5000));
    let resp = client
        .post(format!("{}/query", base))
        .json(&json!({"sql": long_sql}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let many_params: Vec<i32> = (0..33).collect();
    let resp = client
        .post(format!("{}/query", base))
        .json(&json!({"sql": "SELECT * FROM daily_summaries", "params": many_params}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_valid_query_reaches_the_store() {
    let base = serve_app().await;
    let client = reqwest::Client::new();

    // The in-memory store cannot execute SQL; reaching it at all means
    // validation passed.
    let resp = client
        .post(format!("{}/query", base))
        .json(&json!({"sql": "SELECT * FROM daily_summaries"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "database_error");
}
