// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-window arithmetic for chunked history fetches.

use chrono::{Duration, NaiveDate};

/// One fetch window, inclusive on both ends at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Inclusive span in days.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Start of the window as a datetime string with a fixed
    /// time-of-day, for datetime-range endpoints.
    pub fn start_datetime(&self) -> String {
        format!("{}T00:00:00+00:00", self.start)
    }

    /// End of the window as a datetime string covering the whole day.
    pub fn end_datetime(&self) -> String {
        format!("{}T23:59:59+00:00", self.end)
    }
}

/// Partition `total_days` of history into windows of at most
/// `chunk_days`, walking backward in time from `today - offset_days`.
///
/// The first window always ends at the anchor day; each subsequent
/// window ends the day before the previous one starts. Windows are
/// anchored to "now", so the same call issued on different days covers
/// different dates; idempotent merging absorbs the overlap.
pub fn windows(today: NaiveDate, total_days: u32, offset_days: u32, chunk_days: u32) -> Vec<TimeWindow> {
    let mut out = Vec::new();
    if total_days == 0 || chunk_days == 0 {
        return out;
    }

    let mut consumed = 0u32;
    while consumed < total_days {
        let span = chunk_days.min(total_days - consumed);
        let end = today - Duration::days((offset_days + consumed) as i64);
        let start = end - Duration::days((span - 1) as i64);
        out.push(TimeWindow { start, end });
        consumed += span;
    }
    out
}
