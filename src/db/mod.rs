// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer seams.
//!
//! The relational store and the key-value cache are platform-provided
//! in production; the engine only sees these traits. The in-memory
//! implementations in [`memory`] back local runs and every test.

pub mod memory;

pub use memory::{MemoryCache, MemoryStore};

use crate::error::AppError;
use crate::models::{CredentialRecord, MergeWrite, PendingAuth};
use async_trait::async_trait;
use std::time::Duration;

/// Relational store used by the sync engine.
///
/// Only keyed merge-writes, the credential rows, and ad-hoc read
/// queries cross this seam. There is no delete path apart from
/// consuming pending-authorization rows.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get the credential row for a subject.
    async fn get_credential(&self, subject_id: &str) -> Result<Option<CredentialRecord>, AppError>;

    /// Create or replace the credential row for a subject.
    async fn put_credential(&self, credential: &CredentialRecord) -> Result<(), AppError>;

    /// Create a pending authorization row.
    async fn put_auth_state(&self, pending: &PendingAuth) -> Result<(), AppError>;

    /// Remove and return the pending authorization row for a state
    /// token. Single use: a second call with the same token returns None.
    async fn take_auth_state(&self, state: &str) -> Result<Option<PendingAuth>, AppError>;

    /// Apply a batch of keyed insert-or-merge-update writes. For each
    /// write, insert the row if absent, otherwise update only the
    /// listed columns and preserve everything else on the row.
    async fn merge_batch(&self, writes: &[MergeWrite]) -> Result<(), AppError>;

    /// Execute an ad-hoc parameterized read query. The query must
    /// already have passed [`crate::services::query_guard::validate`].
    async fn query(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<Vec<serde_json::Value>, AppError>;
}

/// Key-value cache with TTL semantics.
///
/// A failing cache is an optimization miss, never an error: callers
/// must treat `Err` and `Ok(None)` identically.
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;
}
