// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Oura OAuth client ID (public)
    pub oura_client_id: String,
    /// Oura OAuth client secret
    pub oura_client_secret: String,
    /// Optional long-lived personal access token used when no OAuth
    /// credential is stored. Lets a single-user deployment skip the
    /// interactive flow entirely.
    pub personal_access_token: Option<String>,
    /// Base URL of the Oura API (overridable for tests)
    pub oura_api_base: String,
    /// Base URL of the Oura cloud site (authorize/token endpoints)
    pub oura_cloud_base: String,
    /// Public URL of this service, used to build the OAuth callback
    pub service_url: String,
    /// Server port
    pub port: u16,
    /// Interval between scheduled trailing syncs, in seconds. 0 disables
    /// the background task.
    pub scheduled_sync_interval_secs: u64,
    /// Days re-fetched by each scheduled trailing sync.
    pub scheduled_sync_days: u32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            oura_client_id: "test_client_id".to_string(),
            oura_client_secret: "test_secret".to_string(),
            personal_access_token: None,
            oura_api_base: "https://api.ouraring.com".to_string(),
            oura_cloud_base: "https://cloud.ouraring.com".to_string(),
            service_url: "http://localhost:8080".to_string(),
            port: 8080,
            scheduled_sync_interval_secs: 0,
            scheduled_sync_days: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            oura_client_id: env::var("OURA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("OURA_CLIENT_ID"))?,
            oura_client_secret: env::var("OURA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("OURA_CLIENT_SECRET"))?,
            personal_access_token: env::var("OURA_PERSONAL_ACCESS_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            oura_api_base: env::var("OURA_API_BASE")
                .unwrap_or_else(|_| "https://api.ouraring.com".to_string()),
            oura_cloud_base: env::var("OURA_CLOUD_BASE")
                .unwrap_or_else(|_| "https://cloud.ouraring.com".to_string()),
            service_url: env::var("SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            scheduled_sync_interval_secs: env::var("SCHEDULED_SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            scheduled_sync_days: env::var("SCHEDULED_SYNC_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("OURA_CLIENT_ID", "test_id");
        env::set_var("OURA_CLIENT_SECRET", "test_secret");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.oura_client_id, "test_id");
        assert_eq!(config.oura_client_secret, "test_secret");
        assert_eq!(config.port, 8080);
        assert_eq!(config.scheduled_sync_days, 3);
    }
}
