// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized merge-write records produced by the upsert mapper.
//!
//! A `MergeWrite` is the only shape that crosses from the mapper into
//! the store: a target table, a natural key, and the columns this
//! resource owns. The store inserts the row if absent, otherwise
//! updates exactly these columns and leaves everything else on the row
//! untouched. That column-ownership discipline is what makes writes
//! from different resources against the same row commute.

use serde::{Deserialize, Serialize};

/// Loosely-typed column value, matching the store's numeric/text columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Coerce a raw JSON value to a float column value.
    ///
    /// Numbers and numeric-looking strings parse; everything else
    /// (including malformed strings, bools, arrays) becomes Null rather
    /// than failing the batch.
    pub fn real_from(raw: Option<&serde_json::Value>) -> SqlValue {
        match coerce_f64(raw) {
            Some(n) => SqlValue::Real(n),
            None => SqlValue::Null,
        }
    }

    /// Coerce a raw JSON value to an integer column value, rounding to
    /// the nearest integer.
    pub fn integer_from(raw: Option<&serde_json::Value>) -> SqlValue {
        match coerce_f64(raw) {
            Some(n) => SqlValue::Integer(n.round() as i64),
            None => SqlValue::Null,
        }
    }

    /// Coerce a raw JSON value to a text column value. Non-strings
    /// become Null.
    pub fn text_from(raw: Option<&serde_json::Value>) -> SqlValue {
        match raw {
            Some(serde_json::Value::String(s)) => SqlValue::Text(s.clone()),
            _ => SqlValue::Null,
        }
    }
}

fn coerce_f64(raw: Option<&serde_json::Value>) -> Option<f64> {
    match raw? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// One keyed insert-or-merge-update against a destination table.
#[derive(Debug, Clone, Serialize)]
pub struct MergeWrite {
    /// Destination table name
    pub table: &'static str,
    /// Natural key of the row (a date, remote ID, or timestamp)
    pub key: String,
    /// Columns this write owns, in declaration order
    pub columns: Vec<(&'static str, SqlValue)>,
}

/// Destination table names.
pub mod tables {
    /// Merged daily aggregate, keyed by day; multiple resources each
    /// own a disjoint column set on the same row.
    pub const DAILY_SUMMARIES: &str = "daily_summaries";
    /// Sleep episodes, keyed by remote ID
    pub const SLEEP_SESSIONS: &str = "sleep_sessions";
    /// Heart-rate samples, keyed by timestamp
    pub const HEARTRATE_SAMPLES: &str = "heartrate_samples";
    /// Workouts, keyed by remote ID
    pub const ACTIVITY_LOGS: &str = "activity_logs";
    /// User tags, keyed by remote ID
    pub const TAGS: &str = "tags";
}
