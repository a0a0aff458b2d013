// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: a mock Oura API served by axum on an ephemeral
//! port, and a sync engine wired against it with in-memory storage.

use oura_sync::config::Config;
use oura_sync::db::{KvCache, MemoryCache, MemoryStore, Store};
use oura_sync::services::{
    CatalogLoader, CredentialManager, SyncOrchestrator, UpsertMapper, WindowedFetcher,
};
use std::sync::Arc;

/// Serve an axum router on an ephemeral local port, returning its base URL.
#[allow(dead_code)]
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

/// Build an OpenAPI description document from (name, parameter names)
/// pairs, shaped the way the catalog loader expects.
#[allow(dead_code)]
pub fn openapi_doc(resources: &[(&str, &[&str])]) -> serde_json::Value {
    let mut paths = serde_json::Map::new();
    for (name, params) in resources {
        let parameters: Vec<serde_json::Value> = params
            .iter()
            .map(|p| serde_json::json!({"name": p}))
            .collect();
        paths.insert(
            format!("/v2/usercollection/{}", name),
            serde_json::json!({"get": {"parameters": parameters}}),
        );
    }
    serde_json::json!({"paths": paths})
}

/// A sync engine wired against a mock API base URL, with an in-memory
/// store and a personal access token so no token exchange is needed.
pub struct TestEngine {
    pub store: Arc<MemoryStore>,
    pub orchestrator: SyncOrchestrator,
    pub credentials: CredentialManager,
}

#[allow(dead_code)]
pub fn engine(api_base: &str) -> TestEngine {
    engine_with_config(Config {
        oura_api_base: api_base.to_string(),
        personal_access_token: Some("test_pat".to_string()),
        ..Config::default()
    })
}

#[allow(dead_code)]
pub fn engine_with_config(config: Config) -> TestEngine {
    let store = Arc::new(MemoryStore::new());
    let kv_cache: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
    let store_dyn: Arc<dyn Store> = store.clone();

    let credentials =
        CredentialManager::new(store_dyn.clone(), Arc::new(dashmap::DashMap::new()), &config);
    let catalog = CatalogLoader::new(kv_cache, config.oura_api_base.clone());
    let mapper = UpsertMapper::new(store_dyn);
    let fetcher = Arc::new(WindowedFetcher::new(
        config.oura_api_base.clone(),
        credentials.clone(),
        mapper,
    ));
    let orchestrator = SyncOrchestrator::new(catalog, fetcher);

    TestEngine {
        store,
        orchestrator,
        credentials,
    }
}
