// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth credential and pending-authorization models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored OAuth credential, one row per subject.
///
/// Mutated in place on refresh. `refresh_token` must survive a refresh
/// whose response omits one; the credential manager merges rather than
/// overwriting with null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Subject (user) ID, also the row key
    pub subject_id: String,
    /// Current access token
    pub access_token: String,
    /// Refresh token, absent for personal-access-token setups
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted OAuth scope string
    pub scope: Option<String>,
    /// Token type, normally "Bearer"
    pub token_type: String,
}

/// Single-use, time-bounded OAuth state row.
///
/// Created when an authorization flow starts and deleted on the first
/// callback that presents it. Rows older than 15 minutes are rejected
/// (and deleted) even when otherwise valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuth {
    /// Random URL-safe state token, also the row key
    pub state: String,
    /// Subject the flow was started for
    pub subject_id: String,
    /// When the flow started
    pub created_at: DateTime<Utc>,
}

/// Maximum age of a pending authorization before the callback rejects it.
pub const PENDING_AUTH_MAX_AGE_SECS: i64 = 15 * 60;
