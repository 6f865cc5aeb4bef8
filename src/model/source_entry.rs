use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::util::task_id::TaskPatterns;

/// A time entry pulled from the time tracker.
///
/// The task id is derived once from the description and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub id: u64,
    /// Negative while the timer is still running.
    pub duration_seconds: i64,
    pub start_utc: DateTime<Utc>,
    pub description: String,
    task_id: Option<String>,
}

impl SourceEntry {
    pub fn new<Tz: TimeZone>(
        id: u64,
        duration_seconds: i64,
        start: DateTime<Tz>,
        description: impl Into<String>,
        patterns: &TaskPatterns,
    ) -> Self {
        let description = description.into();
        let task_id = patterns.extract(Some(&description));
        Self {
            id,
            duration_seconds,
            start_utc: start.with_timezone(&Utc),
            description,
            task_id,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Entries without a task id or with a running/zero duration are not synced.
    pub fn is_valid(&self) -> bool {
        self.task_id.is_some() && self.duration_seconds > 0
    }
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, spent: {}s, issue: {} [src#{}]",
            self.start_utc.format("%Y-%m-%d %H:%M"),
            self.description,
            self.duration_seconds,
            self.task_id().unwrap_or("-"),
            self.id
        )
    }
}
