// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorization flow and credential lifecycle tests against a mock
//! authorization server.

mod common;

use axum::{routing::post, Form, Json, Router};
use chrono::{Duration, Utc};
use common::{engine_with_config, serve};
use oura_sync::config::Config;
use oura_sync::db::Store;
use oura_sync::error::AppError;
use oura_sync::models::{CredentialRecord, PendingAuth};
use serde_json::json;
use std::collections::HashMap;

/// Mock token endpoint that always grants the same pair.
fn token_router(grant: serde_json::Value) -> Router {
    Router::new().route(
        "/oauth/token",
        post(move |Form(_form): Form<HashMap<String, String>>| {
            let grant = grant.clone();
            async move { Json(grant) }
        }),
    )
}

fn extract_state(auth_url: &str) -> String {
    auth_url
        .split("state=")
        .nth(1)
        .expect("state param")
        .split('&')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_authorization_roundtrip_stores_credential() {
    let cloud = serve(token_router(json!({
        "access_token": "granted_access",
        "refresh_token": "granted_refresh",
        "expires_in": 86400,
        "token_type": "Bearer"
    })))
    .await;

    let e = engine_with_config(Config {
        oura_cloud_base: cloud,
        ..Config::default()
    });

    let auth_url = e.credentials.start_authorization().await.unwrap();
    assert!(auth_url.contains("/oauth/authorize?"));
    assert!(auth_url.contains("response_type=code"));
    let state = extract_state(&auth_url);

    e.credentials
        .complete_authorization("the_code", &state)
        .await
        .unwrap();

    let credential = e.store.get_credential("default").await.unwrap().unwrap();
    assert_eq!(credential.access_token, "granted_access");
    assert_eq!(credential.refresh_token.as_deref(), Some("granted_refresh"));
    assert!(credential.expires_at.is_some());

    // The freshly granted token is now what the engine hands out.
    assert_eq!(
        e.credentials.get_access_token().await.unwrap(),
        "granted_access"
    );
}

#[tokio::test]
async fn test_state_token_is_single_use() {
    let cloud = serve(token_router(json!({
        "access_token": "a",
        "refresh_token": "r",
        "expires_in": 3600
    })))
    .await;

    let e = engine_with_config(Config {
        oura_cloud_base: cloud,
        ..Config::default()
    });

    let state = extract_state(&e.credentials.start_authorization().await.unwrap());

    e.credentials
        .complete_authorization("code", &state)
        .await
        .unwrap();

    let err = e
        .credentials
        .complete_authorization("code", &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState));
}

#[tokio::test]
async fn test_unknown_state_is_rejected() {
    let e = engine_with_config(Config::default());

    let err = e
        .credentials
        .complete_authorization("code", "never-issued")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState));
}

#[tokio::test]
async fn test_expired_state_is_rejected_and_deleted() {
    let e = engine_with_config(Config::default());

    // Seed a pending authorization older than the 15-minute window.
    e.store
        .put_auth_state(&PendingAuth {
            state: "old_state".to_string(),
            subject_id: "default".to_string(),
            created_at: Utc::now() - Duration::minutes(16),
        })
        .await
        .unwrap();

    let err = e
        .credentials
        .complete_authorization("code", "old_state")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExpiredState));

    // Deleted as a side effect: a replay now fails as unknown.
    let err = e
        .credentials
        .complete_authorization("code", "old_state")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState));
}

#[tokio::test]
async fn test_refresh_preserves_refresh_token_when_response_omits_it() {
    // Grant has no refresh_token field at all.
    let cloud = serve(token_router(json!({
        "access_token": "rotated_access",
        "expires_in": 3600,
        "token_type": "Bearer"
    })))
    .await;

    let e = engine_with_config(Config {
        oura_cloud_base: cloud,
        ..Config::default()
    });

    e.store
        .put_credential(&CredentialRecord {
            subject_id: "default".to_string(),
            access_token: "stale_access".to_string(),
            refresh_token: Some("long_lived_refresh".to_string()),
            expires_at: Some(Utc::now() - Duration::hours(1)),
            scope: Some("daily".to_string()),
            token_type: "Bearer".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        e.credentials.get_access_token().await.unwrap(),
        "rotated_access"
    );

    let credential = e.store.get_credential("default").await.unwrap().unwrap();
    assert_eq!(credential.access_token, "rotated_access");
    // The stored refresh token survived the refresh.
    assert_eq!(
        credential.refresh_token.as_deref(),
        Some("long_lived_refresh")
    );
    assert_eq!(credential.scope.as_deref(), Some("daily"));
}

#[tokio::test]
async fn test_reauthorization_invalidates_cached_token() {
    let cloud = serve(token_router(json!({
        "access_token": "new_access",
        "refresh_token": "new_refresh",
        "expires_in": 3600
    })))
    .await;

    let e = engine_with_config(Config {
        oura_cloud_base: cloud,
        ..Config::default()
    });

    // Seed and warm the cache with a still-valid credential.
    e.store
        .put_credential(&CredentialRecord {
            subject_id: "default".to_string(),
            access_token: "old_access".to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
            scope: None,
            token_type: "Bearer".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(e.credentials.get_access_token().await.unwrap(), "old_access");

    // Re-run the interactive flow.
    let state = extract_state(&e.credentials.start_authorization().await.unwrap());
    e.credentials
        .complete_authorization("code", &state)
        .await
        .unwrap();

    // The cache no longer serves the stale token.
    assert_eq!(e.credentials.get_access_token().await.unwrap(), "new_access");
}

#[tokio::test]
async fn test_failed_token_exchange_propagates() {
    let cloud = serve(Router::new().route(
        "/oauth/token",
        post(|| async { (axum::http::StatusCode::BAD_REQUEST, "invalid_grant") }),
    ))
    .await;

    let e = engine_with_config(Config {
        oura_cloud_base: cloud,
        ..Config::default()
    });

    let state = extract_state(&e.credentials.start_authorization().await.unwrap());
    let err = e
        .credentials
        .complete_authorization("bad_code", &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RemoteApi(_)));
}
