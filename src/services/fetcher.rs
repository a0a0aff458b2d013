// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Windowed resource fetcher.
//!
//! Issues the HTTP requests for one resource over one time window,
//! follows next_token pagination, and retries transient failures with
//! exponential backoff. Every page of records is handed straight to the
//! upsert mapper.

use crate::error::AppError;
use crate::models::{QueryMode, ResourceDescriptor};
use crate::services::credentials::CredentialManager;
use crate::services::mapper::UpsertMapper;
use crate::time_utils::TimeWindow;
use std::time::Duration;

/// Hard cap on pages followed for a single window. Hitting it means
/// the endpoint keeps returning continuation tokens; we stop and log
/// instead of looping forever.
const MAX_PAGES: u32 = 1000;

/// Retries after the first attempt for 429/5xx responses.
const MAX_RETRIES: u32 = 3;

/// Base backoff delay, doubled per retry.
const RETRY_BASE_DELAY_MS: u64 = 250;

/// Fetches one resource across one time window.
#[derive(Clone)]
pub struct WindowedFetcher {
    http: reqwest::Client,
    api_base: String,
    credentials: CredentialManager,
    mapper: UpsertMapper,
}

impl WindowedFetcher {
    pub fn new(api_base: String, credentials: CredentialManager, mapper: UpsertMapper) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            credentials,
            mapper,
        }
    }

    /// Fetch all pages of a resource for one window (or unwindowed when
    /// `window` is None), feeding each page to the mapper.
    ///
    /// Returns the number of HTTP requests issued, retries included.
    pub async fn fetch(
        &self,
        resource: &ResourceDescriptor,
        window: Option<&TimeWindow>,
    ) -> Result<u32, AppError> {
        let access_token = self.credentials.get_access_token().await?;
        let url = format!("{}{}", self.api_base, resource.path);

        let window_params = match (resource.query_mode, window) {
            (QueryMode::None, _) | (_, None) => Vec::new(),
            (QueryMode::DateRange, Some(w)) => vec![
                ("start_date".to_string(), w.start.to_string()),
                ("end_date".to_string(), w.end.to_string()),
            ],
            (QueryMode::DateTimeRange, Some(w)) => vec![
                ("start_datetime".to_string(), w.start_datetime()),
                ("end_datetime".to_string(), w.end_datetime()),
            ],
        };

        let mut requests = 0u32;
        let mut next_token: Option<String> = None;
        let mut page = 0u32;

        loop {
            page += 1;

            let mut params = window_params.clone();
            if let Some(token) = &next_token {
                params.push(("next_token".to_string(), token.clone()));
            }

            let (response, attempts) = self.send_with_retry(&url, &access_token, &params).await?;
            requests += attempts;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                let excerpt: String = body.chars().take(200).collect();
                tracing::error!(
                    resource = %resource.name,
                    status,
                    body = %excerpt,
                    "Resource fetch failed after retries"
                );
                return Err(AppError::RemoteFetch {
                    resource: resource.name.clone(),
                    status,
                    body: excerpt,
                });
            }

            let payload: serde_json::Value = response
                .json()
                .await
                .map_err(|e| AppError::RemoteApi(format!("JSON parse error: {}", e)))?;

            // Collection endpoints wrap records in {data, next_token};
            // a bare object (e.g. personal_info) is a single record.
            let (records, token) = match payload.get("data").and_then(|d| d.as_array()) {
                Some(data) => (
                    data.clone(),
                    payload
                        .get("next_token")
                        .and_then(|t| t.as_str())
                        .map(str::to_string),
                ),
                None => (vec![payload], None),
            };

            self.mapper.apply(&resource.name, &records).await?;

            next_token = token;
            if next_token.is_none() {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(
                    resource = %resource.name,
                    pages = page,
                    "Pagination safeguard tripped, abandoning remaining pages"
                );
                break;
            }
        }

        Ok(requests)
    }

    /// Issue one request, retrying 429 and 5xx responses with
    /// exponential backoff. Other statuses return immediately. When the
    /// retry budget is exhausted the last failing response is returned
    /// for the caller to judge.
    async fn send_with_retry(
        &self,
        url: &str,
        access_token: &str,
        params: &[(String, String)],
    ) -> Result<(reqwest::Response, u32), AppError> {
        let mut attempts = 0u32;
        loop {
            let response = self
                .http
                .get(url)
                .bearer_auth(access_token)
                .query(params)
                .send()
                .await
                .map_err(|e| AppError::RemoteApi(e.to_string()))?;
            attempts += 1;

            let status = response.status();
            let retryable = status.as_u16() == 429 || status.is_server_error();
            if !retryable || attempts > MAX_RETRIES {
                return Ok((response, attempts));
            }

            let delay = RETRY_BASE_DELAY_MS * (1 << (attempts - 1));
            tracing::warn!(
                url,
                status = status.as_u16(),
                attempt = attempts,
                delay_ms = delay,
                "Transient response, backing off"
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}
