// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestrator.
//!
//! Partitions the requested historical span into per-resource windows
//! and drives fetch+merge for every resource concurrently. Resources
//! fan out as independent tasks; windows within one resource run
//! strictly in order, newest first. A failing resource never aborts its
//! siblings: the summary always characterizes every resource as
//! succeeded or failed.

use crate::services::catalog::CatalogLoader;
use crate::services::fetcher::WindowedFetcher;
use crate::models::{QueryMode, ResourceDescriptor};
use crate::time_utils::windows;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Outcome of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Resources that completed every window
    pub successful: u32,
    /// Resources that failed at least one window
    pub failed: u32,
    /// HTTP requests issued, retries included
    pub total_requests: u32,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Names of the failed resources
    pub failed_resources: Vec<String>,
}

/// Drives a full sync across the discovered resource catalog.
#[derive(Clone)]
pub struct SyncOrchestrator {
    catalog: CatalogLoader,
    fetcher: Arc<WindowedFetcher>,
}

impl SyncOrchestrator {
    pub fn new(catalog: CatalogLoader, fetcher: Arc<WindowedFetcher>) -> Self {
        Self { catalog, fetcher }
    }

    /// Sync `total_days` of history ending `offset_days` ago, for every
    /// discovered resource or the intersection with `resource_filter`.
    pub async fn sync(
        &self,
        total_days: u32,
        offset_days: u32,
        resource_filter: Option<&[String]>,
    ) -> SyncSummary {
        let started = Instant::now();

        let mut resources = self.catalog.list_resources().await;
        if let Some(filter) = resource_filter {
            resources.retain(|r| filter.iter().any(|f| f == &r.name));
        }

        tracing::info!(
            total_days,
            offset_days,
            resources = resources.len(),
            "Starting sync"
        );

        let mut tasks: JoinSet<(String, Result<u32, crate::error::AppError>)> = JoinSet::new();
        for resource in resources {
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move {
                let name = resource.name.clone();
                let result = sync_resource(&fetcher, &resource, total_days, offset_days).await;
                (name, result)
            });
        }

        let mut summary = SyncSummary {
            successful: 0,
            failed: 0,
            total_requests: 0,
            duration_ms: 0,
            failed_resources: Vec::new(),
        };

        // Wait for every resource task to settle; no failure cancels a
        // sibling's in-flight work.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(requests))) => {
                    summary.successful += 1;
                    summary.total_requests += requests;
                    tracing::debug!(resource = %name, requests, "Resource synced");
                }
                Ok((name, Err(e))) => {
                    summary.failed += 1;
                    summary.failed_resources.push(name.clone());
                    tracing::error!(resource = %name, error = %e, "Resource sync failed");
                }
                Err(join_err) => {
                    summary.failed += 1;
                    summary.failed_resources.push("<panicked task>".to_string());
                    tracing::error!(error = %join_err, "Resource task panicked");
                }
            }
        }

        summary.failed_resources.sort();
        summary.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            total_requests = summary.total_requests,
            duration_ms = summary.duration_ms,
            "Sync finished"
        );
        summary
    }
}

/// Sync one resource: a single request when unwindowed, otherwise one
/// fetch per window walking backward from `now - offset_days`.
///
/// Windows run sequentially; the first failing window fails the
/// resource and no later window is attempted.
async fn sync_resource(
    fetcher: &WindowedFetcher,
    resource: &ResourceDescriptor,
    total_days: u32,
    offset_days: u32,
) -> Result<u32, crate::error::AppError> {
    if resource.query_mode == QueryMode::None {
        return fetcher.fetch(resource, None).await;
    }

    let today = chrono::Utc::now().date_naive();
    let mut requests = 0u32;
    for window in windows(today, total_days, offset_days, resource.chunk_days()) {
        requests += fetcher.fetch(resource, Some(&window)).await?;
    }
    Ok(requests)
}
