// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upsert mapper: raw API payloads to normalized merge-writes.
//!
//! Each known resource owns a dedicated transform that extracts a fixed
//! set of columns from every raw record and keys the write by the
//! record's natural key. The three daily collections all target the
//! same `daily_summaries` row for a given day but own disjoint column
//! sets, so their merges commute and re-applying a batch is a no-op.
//!
//! Raw records stay `serde_json::Value` only inside this module; they
//! are coerced into typed [`SqlValue`] columns before anything is
//! written. Malformed numeric fields become Null rather than failing
//! the batch.

use crate::db::Store;
use crate::error::AppError;
use crate::models::record::tables;
use crate::models::{MergeWrite, SqlValue};
use std::sync::Arc;

/// Writes are split into sub-batches to bound peak memory and respect
/// the store's batch-size limits.
const SUB_BATCH_SIZE: usize = 500;

/// Known resource shapes. Resource names outside this set are ignored,
/// which keeps the mapper forward-compatible with catalog growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    DailyActivity,
    DailyReadiness,
    DailySleep,
    Sleep,
    Heartrate,
    Workout,
    EnhancedTag,
}

impl ResourceKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "daily_activity" => Some(Self::DailyActivity),
            "daily_readiness" => Some(Self::DailyReadiness),
            "daily_sleep" => Some(Self::DailySleep),
            "sleep" => Some(Self::Sleep),
            "heartrate" => Some(Self::Heartrate),
            "workout" => Some(Self::Workout),
            "enhanced_tag" => Some(Self::EnhancedTag),
            _ => None,
        }
    }
}

/// Converts raw record batches into persisted merges.
#[derive(Clone)]
pub struct UpsertMapper {
    store: Arc<dyn Store>,
}

impl UpsertMapper {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Transform and persist one batch of raw records for a resource.
    ///
    /// Unknown resources are a silent no-op. Records missing their
    /// natural key are skipped individually; they never fail the batch.
    pub async fn apply(
        &self,
        resource_name: &str,
        records: &[serde_json::Value],
    ) -> Result<(), AppError> {
        let kind = match ResourceKind::from_name(resource_name) {
            Some(kind) => kind,
            None => {
                tracing::debug!(resource = resource_name, "No transform for resource, skipping");
                return Ok(());
            }
        };

        let mut writes = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for record in records {
            match transform(kind, record) {
                Some(write) => writes.push(write),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(
                resource = resource_name,
                skipped,
                "Skipped records without a usable natural key"
            );
        }

        for chunk in writes.chunks(SUB_BATCH_SIZE) {
            self.store.merge_batch(chunk).await?;
        }

        tracing::debug!(
            resource = resource_name,
            records = records.len(),
            writes = writes.len(),
            "Batch merged"
        );
        Ok(())
    }
}

/// Build the merge-write for one raw record, or None when the record
/// has no usable natural key.
fn transform(kind: ResourceKind, record: &serde_json::Value) -> Option<MergeWrite> {
    let obj = record.as_object()?;
    let field = |name: &str| obj.get(name);
    let key_str = |name: &str| obj.get(name).and_then(|v| v.as_str()).map(str::to_string);

    let write = match kind {
        ResourceKind::DailyActivity => MergeWrite {
            table: tables::DAILY_SUMMARIES,
            key: key_str("day")?,
            columns: vec![
                ("activity_score", SqlValue::integer_from(field("score"))),
                ("steps", SqlValue::integer_from(field("steps"))),
                (
                    "active_calories",
                    SqlValue::integer_from(field("active_calories")),
                ),
                (
                    "total_calories",
                    SqlValue::integer_from(field("total_calories")),
                ),
            ],
        },
        ResourceKind::DailyReadiness => MergeWrite {
            table: tables::DAILY_SUMMARIES,
            key: key_str("day")?,
            columns: vec![
                ("readiness_score", SqlValue::integer_from(field("score"))),
                (
                    "temperature_deviation",
                    SqlValue::real_from(field("temperature_deviation")),
                ),
            ],
        },
        ResourceKind::DailySleep => MergeWrite {
            table: tables::DAILY_SUMMARIES,
            key: key_str("day")?,
            columns: vec![("sleep_score", SqlValue::integer_from(field("score")))],
        },
        ResourceKind::Sleep => MergeWrite {
            table: tables::SLEEP_SESSIONS,
            key: key_str("id")?,
            columns: vec![
                ("day", SqlValue::text_from(field("day"))),
                ("bedtime_start", SqlValue::text_from(field("bedtime_start"))),
                ("bedtime_end", SqlValue::text_from(field("bedtime_end"))),
                (
                    "total_sleep_duration",
                    SqlValue::integer_from(field("total_sleep_duration")),
                ),
                ("time_in_bed", SqlValue::integer_from(field("time_in_bed"))),
                ("efficiency", SqlValue::integer_from(field("efficiency"))),
                (
                    "average_heart_rate",
                    SqlValue::real_from(field("average_heart_rate")),
                ),
                ("average_hrv", SqlValue::real_from(field("average_hrv"))),
            ],
        },
        ResourceKind::Heartrate => MergeWrite {
            table: tables::HEARTRATE_SAMPLES,
            key: key_str("timestamp")?,
            columns: vec![
                ("bpm", SqlValue::integer_from(field("bpm"))),
                ("source", SqlValue::text_from(field("source"))),
            ],
        },
        ResourceKind::Workout => MergeWrite {
            table: tables::ACTIVITY_LOGS,
            key: key_str("id")?,
            columns: vec![
                ("day", SqlValue::text_from(field("day"))),
                ("activity", SqlValue::text_from(field("activity"))),
                (
                    "start_datetime",
                    SqlValue::text_from(field("start_datetime")),
                ),
                ("end_datetime", SqlValue::text_from(field("end_datetime"))),
                ("calories", SqlValue::real_from(field("calories"))),
                ("distance", SqlValue::real_from(field("distance"))),
                ("intensity", SqlValue::text_from(field("intensity"))),
            ],
        },
        ResourceKind::EnhancedTag => MergeWrite {
            table: tables::TAGS,
            key: key_str("id")?,
            columns: vec![
                ("start_day", SqlValue::text_from(field("start_day"))),
                ("tag_type", SqlValue::text_from(field("tag_type_code"))),
                ("comment", SqlValue::text_from(field("comment"))),
            ],
        },
    };

    Some(write)
}
