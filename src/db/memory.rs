// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store and cache implementations.
//!
//! Stand-ins for the platform-provided relational store and key-value
//! cache. Used by local runs and by the test suite; merge semantics
//! here mirror what the production store guarantees (insert-if-absent,
//! else update only the written columns).

use crate::db::{KvCache, Store};
use crate::error::AppError;
use crate::models::{CredentialRecord, MergeWrite, PendingAuth, SqlValue};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// In-memory relational store.
#[derive(Default)]
pub struct MemoryStore {
    credentials: DashMap<String, CredentialRecord>,
    auth_states: DashMap<String, PendingAuth>,
    /// (table, key) -> column -> value
    rows: DashMap<(String, String), HashMap<String, SqlValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a row for assertions in tests.
    pub fn row(&self, table: &str, key: &str) -> Option<HashMap<String, SqlValue>> {
        self.rows
            .get(&(table.to_string(), key.to_string()))
            .map(|r| r.clone())
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.rows.iter().filter(|e| e.key().0 == table).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_credential(&self, subject_id: &str) -> Result<Option<CredentialRecord>, AppError> {
        Ok(self.credentials.get(subject_id).map(|c| c.clone()))
    }

    async fn put_credential(&self, credential: &CredentialRecord) -> Result<(), AppError> {
        self.credentials
            .insert(credential.subject_id.clone(), credential.clone());
        Ok(())
    }

    async fn put_auth_state(&self, pending: &PendingAuth) -> Result<(), AppError> {
        self.auth_states.insert(pending.state.clone(), pending.clone());
        Ok(())
    }

    async fn take_auth_state(&self, state: &str) -> Result<Option<PendingAuth>, AppError> {
        Ok(self.auth_states.remove(state).map(|(_, v)| v))
    }

    async fn merge_batch(&self, writes: &[MergeWrite]) -> Result<(), AppError> {
        for write in writes {
            let mut row = self
                .rows
                .entry((write.table.to_string(), write.key.clone()))
                .or_default();
            for (column, value) in &write.columns {
                row.insert(column.to_string(), value.clone());
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        _sql: &str,
        _params: &[serde_json::Value],
    ) -> Result<Vec<serde_json::Value>, AppError> {
        // Ad-hoc SQL belongs to the platform store; nothing to execute here.
        Err(AppError::Database(
            "ad-hoc queries are not supported by the in-memory store".to_string(),
        ))
    }
}

/// In-memory key-value cache with TTL.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires) = entry.value();
            if Instant::now() < *expires {
                return Ok(Some(value.clone()));
            }
        }
        // Expired entries are dropped lazily on the next put.
        Ok(None)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }
}
