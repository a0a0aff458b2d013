// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource catalog discovery.
//!
//! Reads the remote OpenAPI description, filters it down to the
//! syncable collection endpoints, and infers how each one must be
//! queried. The result is cached for 24 hours in the key-value cache;
//! the cache is an optimization only and every failure around it
//! degrades to re-fetching.

use crate::db::KvCache;
use crate::models::{QueryMode, ResourceDescriptor};
use std::sync::Arc;
use std::time::Duration;

const CATALOG_CACHE_KEY: &str = "resource_catalog";
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

/// Path of the machine-readable API description, relative to the API base.
const OPENAPI_DOC_PATH: &str = "/v2/static/json/openapi.json";

/// Prefix of the collection endpoints we sync.
const COLLECTION_PREFIX: &str = "/v2/usercollection/";

/// Endpoints that declare datetime parameters but must be queried at
/// day granularity.
const DATE_RANGE_OVERRIDES: &[&str] = &["sleep", "sleep_time"];

/// Discovers and caches the list of syncable resources.
#[derive(Clone)]
pub struct CatalogLoader {
    http: reqwest::Client,
    cache: Arc<dyn KvCache>,
    api_base: String,
}

impl CatalogLoader {
    pub fn new(cache: Arc<dyn KvCache>, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            cache,
            api_base,
        }
    }

    /// List syncable resources, sorted by name.
    ///
    /// Returns an empty list when the description document cannot be
    /// fetched; callers treat that as "nothing to sync this run".
    pub async fn list_resources(&self) -> Vec<ResourceDescriptor> {
        match self.cache.get(CATALOG_CACHE_KEY).await {
            Ok(Some(cached)) => {
                if let Ok(resources) = serde_json::from_str::<Vec<ResourceDescriptor>>(&cached) {
                    tracing::debug!(count = resources.len(), "Resource catalog cache hit");
                    return resources;
                }
                tracing::debug!("Ignoring unparseable catalog cache entry");
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "Catalog cache read failed, re-fetching"),
        }

        let doc = match self.fetch_description().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch API description, no resources this run");
                return Vec::new();
            }
        };

        let resources = parse_catalog(&doc);
        tracing::info!(count = resources.len(), "Resource catalog loaded");

        if let Ok(serialized) = serde_json::to_string(&resources) {
            if let Err(e) = self
                .cache
                .put(CATALOG_CACHE_KEY, &serialized, CATALOG_CACHE_TTL)
                .await
            {
                tracing::debug!(error = %e, "Catalog cache write failed, continuing uncached");
            }
        }

        resources
    }

    async fn fetch_description(&self) -> Result<serde_json::Value, reqwest::Error> {
        let url = format!("{}{}", self.api_base, OPENAPI_DOC_PATH);
        self.http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Extract resource descriptors from an OpenAPI description.
///
/// Keeps GET collection endpoints that take no path parameters and are
/// not sandbox endpoints. Query mode is inferred from the declared
/// parameters, with datetime ranges taking precedence over date ranges
/// except for the fixed override set.
fn parse_catalog(doc: &serde_json::Value) -> Vec<ResourceDescriptor> {
    let mut resources: Vec<ResourceDescriptor> = Vec::new();

    let paths = match doc.get("paths").and_then(|p| p.as_object()) {
        Some(paths) => paths,
        None => return resources,
    };

    for (path, item) in paths {
        if !path.starts_with(COLLECTION_PREFIX) {
            continue;
        }
        // Detail endpoints take a document ID path parameter.
        if path.contains('{') {
            continue;
        }
        if path.contains("sandbox") {
            continue;
        }
        let get_op = match item.get("get") {
            Some(op) => op,
            None => continue,
        };

        let name = match path.strip_prefix(COLLECTION_PREFIX) {
            Some(name) if !name.is_empty() => name.trim_end_matches('/').to_string(),
            _ => continue,
        };

        let params: Vec<&str> = get_op
            .get("parameters")
            .and_then(|p| p.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|p| p.get("name").and_then(|n| n.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        let paginated = params.contains(&"next_token");

        let mut query_mode = if params.contains(&"start_datetime") {
            QueryMode::DateTimeRange
        } else if params.contains(&"start_date") {
            QueryMode::DateRange
        } else {
            QueryMode::None
        };
        if query_mode == QueryMode::DateTimeRange && DATE_RANGE_OVERRIDES.contains(&name.as_str()) {
            query_mode = QueryMode::DateRange;
        }

        resources.push(ResourceDescriptor {
            name,
            path: path.clone(),
            query_mode,
            paginated,
        });
    }

    resources.sort_by(|a, b| a.name.cmp(&b.name));
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> serde_json::Value {
        json!({
            "paths": {
                "/v2/usercollection/daily_sleep": {
                    "get": {
                        "parameters": [
                            {"name": "start_date"},
                            {"name": "end_date"},
                            {"name": "next_token"}
                        ]
                    }
                },
                "/v2/usercollection/heartrate": {
                    "get": {
                        "parameters": [
                            {"name": "start_datetime"},
                            {"name": "end_datetime"},
                            {"name": "next_token"}
                        ]
                    }
                },
                "/v2/usercollection/sleep": {
                    "get": {
                        "parameters": [
                            {"name": "start_datetime"},
                            {"name": "end_datetime"},
                            {"name": "next_token"}
                        ]
                    }
                },
                "/v2/usercollection/personal_info": {
                    "get": {}
                },
                "/v2/usercollection/daily_sleep/{document_id}": {
                    "get": {
                        "parameters": [{"name": "document_id"}]
                    }
                },
                "/v2/sandbox/usercollection/daily_sleep": {
                    "get": {
                        "parameters": [{"name": "start_date"}]
                    }
                },
                "/v2/webhook/subscription": {
                    "get": {}
                }
            }
        })
    }

    #[test]
    fn test_parse_filters_and_sorts() {
        let resources = parse_catalog(&sample_doc());
        let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["daily_sleep", "heartrate", "personal_info", "sleep"]);
    }

    #[test]
    fn test_query_mode_inference() {
        let resources = parse_catalog(&sample_doc());
        let by_name = |n: &str| resources.iter().find(|r| r.name == n).unwrap();

        assert_eq!(by_name("daily_sleep").query_mode, QueryMode::DateRange);
        assert_eq!(by_name("heartrate").query_mode, QueryMode::DateTimeRange);
        assert_eq!(by_name("personal_info").query_mode, QueryMode::None);
        // Override forces day granularity despite datetime parameters.
        assert_eq!(by_name("sleep").query_mode, QueryMode::DateRange);
    }

    #[test]
    fn test_pagination_inference() {
        let resources = parse_catalog(&sample_doc());
        let by_name = |n: &str| resources.iter().find(|r| r.name == n).unwrap();

        assert!(by_name("daily_sleep").paginated);
        assert!(!by_name("personal_info").paginated);
    }

    #[test]
    fn test_chunk_days() {
        let resources = parse_catalog(&sample_doc());
        let by_name = |n: &str| resources.iter().find(|r| r.name == n).unwrap();

        assert_eq!(by_name("heartrate").chunk_days(), 29);
        assert_eq!(by_name("daily_sleep").chunk_days(), 90);
    }

    #[test]
    fn test_empty_doc_yields_no_resources() {
        assert!(parse_catalog(&json!({})).is_empty());
        assert!(parse_catalog(&json!({"paths": {}})).is_empty());
    }
}
