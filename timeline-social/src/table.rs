//! Time-indexed view over normalized records.
//!
//! Rows are keyed by creation time converted from UTC into the target IANA zone,
//! and carry the local weekday name. Queries borrow the table and never mutate it.
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;

use crate::error::{Result, SocialError};
use crate::normalize::NormalizedRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub local_time: DateTime<Tz>,
    /// English weekday name of `local_time` (`"Monday"` … `"Sunday"`).
    pub day: String,
    pub record: NormalizedRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    tz: Tz,
    rows: Vec<TimelineRow>,
}

/// Build a [`Timeline`] from records (order preserved) in `target_timezone`.
pub fn to_table(records: Vec<NormalizedRecord>, target_timezone: &str) -> Result<Timeline> {
    let tz: Tz = target_timezone
        .parse()
        .map_err(|_| SocialError::UnknownTimeZone(target_timezone.to_string()))?;

    let rows = records
        .into_iter()
        .map(|record| {
            let local_time = record.created_at.with_timezone(&tz);
            TimelineRow {
                day: local_time.format("%A").to_string(),
                local_time,
                record,
            }
        })
        .collect();

    Ok(Timeline { tz, rows })
}

impl Timeline {
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn rows(&self) -> &[TimelineRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of records per local calendar day.
    pub fn per_day_counts(&self) -> BTreeMap<NaiveDate, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.local_time.date_naive()).or_insert(0) += 1;
        }
        counts
    }

    /// Rows whose local day is `day` (`"Monday"`, `"mon"`, case-insensitive).
    pub fn on_weekday(&self, day: &str) -> Result<Vec<&TimelineRow>> {
        let wanted: Weekday = day
            .trim()
            .parse()
            .map_err(|_| SocialError::UnknownWeekday(day.to_string()))?;
        Ok(self
            .rows
            .iter()
            .filter(|row| row.local_time.weekday() == wanted)
            .collect())
    }
}
