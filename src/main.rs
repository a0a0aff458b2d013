// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Oura-Sync API Server
//!
//! Periodically and on demand pulls time-partitioned health-tracker
//! data from the Oura API, merges it into normalized relational rows,
//! and serves a guarded read-only query surface over the result.

use oura_sync::{
    config::Config,
    db::{KvCache, MemoryCache, MemoryStore, Store},
    services::{CatalogLoader, CredentialManager, SyncOrchestrator, UpsertMapper, WindowedFetcher},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Oura-Sync API");

    // The relational store and KV cache are platform services in
    // production; the in-memory implementations stand in for local runs.
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let kv_cache: Arc<dyn KvCache> = Arc::new(MemoryCache::new());

    // Token cache scoped to this instance, injected explicitly.
    let token_cache = Arc::new(dashmap::DashMap::new());
    tracing::info!("Token cache initialized");

    let credentials = CredentialManager::new(store.clone(), token_cache, &config);
    let catalog = CatalogLoader::new(kv_cache, config.oura_api_base.clone());
    let mapper = UpsertMapper::new(store.clone());
    let fetcher = Arc::new(WindowedFetcher::new(
        config.oura_api_base.clone(),
        credentials.clone(),
        mapper,
    ));
    let orchestrator = SyncOrchestrator::new(catalog, fetcher);

    // Scheduled trailing sync: re-fetch the last few days on an
    // interval and lean on merge idempotence for the overlap.
    if config.scheduled_sync_interval_secs > 0 {
        let orchestrator = orchestrator.clone();
        let interval_secs = config.scheduled_sync_interval_secs;
        let days = config.scheduled_sync_days;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                tracing::info!(days, "Scheduled trailing sync starting");
                orchestrator.sync(days, 0, None).await;
            }
        });
        tracing::info!(
            interval_secs,
            days = config.scheduled_sync_days,
            "Scheduled sync enabled"
        );
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        credentials,
        orchestrator,
    });

    let app = oura_sync::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oura_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
