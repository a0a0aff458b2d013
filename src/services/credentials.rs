// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credential lifecycle.
//!
//! Handles:
//! - Access token lookup with an in-process cache
//! - Token refresh when expired (refresh token always preserved)
//! - Static personal-access-token fallback
//! - The interactive authorization flow with single-use state tokens

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::models::credential::PENDING_AUTH_MAX_AGE_SECS;
use crate::models::{CredentialRecord, PendingAuth};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::sync::Arc;

/// Margin before token expiration when we proactively refresh.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Cache lifetime assigned to the static fallback token, which has no
/// real expiry of its own.
const FALLBACK_TOKEN_TTL_SECS: i64 = 365 * 24 * 3600;

/// Subject ID used by this single-subject deployment.
const SUBJECT_ID: &str = "default";

/// OAuth scopes requested during authorization.
const OAUTH_SCOPES: &str = "email personal daily heartrate workout tag session spo2";

/// Cached access token with expiry information.
#[derive(Clone)]
pub struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Shared token cache type, constructed in `main` and injected.
///
/// Local to one running instance; the store stays the durable source of
/// truth and every reader tolerates a miss.
pub type TokenCache = Arc<DashMap<String, CachedToken>>;

/// Token endpoint response from the authorization server.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Manages the access-token lifecycle for the engine's subject.
#[derive(Clone)]
pub struct CredentialManager {
    http: reqwest::Client,
    store: Arc<dyn Store>,
    token_cache: TokenCache,
    client_id: String,
    client_secret: String,
    cloud_base: String,
    service_url: String,
    personal_access_token: Option<String>,
}

impl CredentialManager {
    pub fn new(store: Arc<dyn Store>, token_cache: TokenCache, config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            token_cache,
            client_id: config.oura_client_id.clone(),
            client_secret: config.oura_client_secret.clone(),
            cloud_base: config.oura_cloud_base.clone(),
            service_url: config.service_url.clone(),
            personal_access_token: config.personal_access_token.clone(),
        }
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid (non-expired) access token.
    ///
    /// Lookup order:
    /// 1. In-process cache (fast path, no I/O), with a 60s margin
    /// 2. Stored credential, if its access token is still valid
    /// 3. Refresh-token exchange, persisting the new pair
    /// 4. Static personal access token, if configured
    ///
    /// Fails with `CredentialMissing` when none of these produce a
    /// token; the caller must run the interactive flow.
    pub async fn get_access_token(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let margin = Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS);

        if let Some(cached) = self.token_cache.get(SUBJECT_ID) {
            if now + margin < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        if let Some(credential) = self.store.get_credential(SUBJECT_ID).await? {
            // A credential without an expiry (personal token stored as a
            // row) never needs refreshing.
            let valid = match credential.expires_at {
                Some(expires_at) => now + margin < expires_at,
                None => true,
            };

            if valid {
                let expires_at = credential
                    .expires_at
                    .unwrap_or(now + Duration::seconds(FALLBACK_TOKEN_TTL_SECS));
                self.cache_token(&credential.access_token, expires_at);
                return Ok(credential.access_token);
            }

            if let Some(refresh_token) = credential.refresh_token.clone() {
                return self.refresh(credential, &refresh_token).await;
            }
        }

        if let Some(token) = &self.personal_access_token {
            tracing::debug!("No stored credential, using personal access token");
            self.cache_token(token, now + Duration::seconds(FALLBACK_TOKEN_TTL_SECS));
            return Ok(token.clone());
        }

        Err(AppError::CredentialMissing)
    }

    /// Exchange a refresh token for a new pair and persist it.
    ///
    /// The stored refresh token is only replaced when the response
    /// carries a new one; it is never dropped.
    async fn refresh(
        &self,
        previous: CredentialRecord,
        refresh_token: &str,
    ) -> Result<String, AppError> {
        tracing::info!("Access token expired, refreshing");

        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .await?;

        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        let updated = CredentialRecord {
            subject_id: previous.subject_id,
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.or(previous.refresh_token),
            expires_at,
            scope: response.scope.or(previous.scope),
            token_type: response
                .token_type
                .unwrap_or_else(|| previous.token_type.clone()),
        };

        self.store.put_credential(&updated).await?;

        self.cache_token(
            &updated.access_token,
            expires_at.unwrap_or(Utc::now() + Duration::seconds(FALLBACK_TOKEN_TTL_SECS)),
        );

        tracing::info!("Token refreshed and cached");
        Ok(updated.access_token)
    }

    fn cache_token(&self, access_token: &str, expires_at: DateTime<Utc>) {
        self.token_cache.insert(
            SUBJECT_ID.to_string(),
            CachedToken {
                access_token: access_token.to_string(),
                expires_at,
            },
        );
    }

    // ─── Authorization Flow ──────────────────────────────────────────────────

    /// Start the interactive authorization flow.
    ///
    /// Persists a single-use state row and returns the provider
    /// authorization URL to redirect the user to.
    pub async fn start_authorization(&self) -> Result<String, AppError> {
        let state = random_state_token()?;

        let pending = PendingAuth {
            state: state.clone(),
            subject_id: SUBJECT_ID.to_string(),
            created_at: Utc::now(),
        };
        self.store.put_auth_state(&pending).await?;

        let callback_url = format!("{}/auth/callback", self.service_url);
        let auth_url = format!(
            "{}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.cloud_base,
            self.client_id,
            urlencoding::encode(&callback_url),
            urlencoding::encode(OAUTH_SCOPES),
            state
        );

        tracing::info!("Starting OAuth flow");
        Ok(auth_url)
    }

    /// Complete the authorization flow from the provider callback.
    ///
    /// The state row is consumed on first use; replays fail with
    /// `InvalidState`, and rows older than 15 minutes fail with
    /// `ExpiredState` (already deleted as a side effect).
    pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<(), AppError> {
        let pending = self
            .store
            .take_auth_state(state)
            .await?
            .ok_or(AppError::InvalidState)?;

        let age = Utc::now() - pending.created_at;
        if age > Duration::seconds(PENDING_AUTH_MAX_AGE_SECS) {
            tracing::warn!(age_secs = age.num_seconds(), "Authorization state expired");
            return Err(AppError::ExpiredState);
        }

        let callback_url = format!("{}/auth/callback", self.service_url);
        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &callback_url),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .await?;

        // Merge with any existing row so a response without a refresh
        // token cannot clobber one we already hold.
        let existing = self.store.get_credential(&pending.subject_id).await?;

        let credential = CredentialRecord {
            subject_id: pending.subject_id.clone(),
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or(existing.as_ref().and_then(|c| c.refresh_token.clone())),
            expires_at: response
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            scope: response.scope,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
        };

        self.store.put_credential(&credential).await?;

        // Drop any stale cached token for this subject.
        self.token_cache.remove(&pending.subject_id);

        tracing::info!("OAuth callback handled, credential stored");
        Ok(())
    }

    /// POST to the token endpoint and parse the response.
    ///
    /// Failures here are fatal for the calling operation and are not
    /// retried; retry is the caller's concern, if any.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let url = format!("{}/oauth/token", self.cloud_base);
        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::RemoteApi(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Token exchange failed");
            return Err(AppError::RemoteApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::RemoteApi(format!("Failed to parse token response: {}", e)))
    }
}

/// Generate a random URL-safe state token.
fn random_state_token() -> Result<String, AppError> {
    let mut bytes = [0u8; 32];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
