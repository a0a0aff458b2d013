// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Discovered remote resource descriptors.

use serde::{Deserialize, Serialize};

/// How a resource endpoint is queried over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Single unwindowed request (e.g. personal_info)
    None,
    /// start_date/end_date, day granularity
    DateRange,
    /// start_datetime/end_datetime with a fixed time-of-day
    DateTimeRange,
}

/// One syncable remote collection, as discovered from the API
/// description document. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Short name, e.g. "daily_sleep"
    pub name: String,
    /// Endpoint path relative to the API base, e.g. "/v2/usercollection/daily_sleep"
    pub path: String,
    /// Time-windowing behavior of the endpoint
    pub query_mode: QueryMode,
    /// Whether the endpoint pages via next_token
    pub paginated: bool,
}

impl ResourceDescriptor {
    /// Maximum window span in days for one fetch of this resource.
    ///
    /// The API enforces a 30-day maximum range on the heart-rate
    /// collection; everything else accepts 90 days comfortably.
    pub fn chunk_days(&self) -> u32 {
        if self.name == "heartrate" {
            29
        } else {
            90
        }
    }
}
