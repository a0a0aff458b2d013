// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credential;
pub mod record;
pub mod resource;

pub use credential::{CredentialRecord, PendingAuth};
pub use record::{MergeWrite, SqlValue};
pub use resource::{QueryMode, ResourceDescriptor};
