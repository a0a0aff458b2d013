// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Oura-Sync: pull health-tracker data into a relational store
//!
//! This crate provides the synchronization engine: credential
//! lifecycle, resource catalog discovery, windowed fetching with retry,
//! conflict-merging upserts, and a guarded read-only query surface.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{CredentialManager, SyncOrchestrator};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub credentials: CredentialManager,
    pub orchestrator: SyncOrchestrator,
}
