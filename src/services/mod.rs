// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - the synchronization engine.

pub mod catalog;
pub mod credentials;
pub mod fetcher;
pub mod mapper;
pub mod query_guard;
pub mod sync;

pub use catalog::CatalogLoader;
pub use credentials::{CredentialManager, TokenCache};
pub use fetcher::WindowedFetcher;
pub use mapper::UpsertMapper;
pub use sync::{SyncOrchestrator, SyncSummary};
