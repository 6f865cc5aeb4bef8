use chrono::{DateTime, Utc};

use crate::model::source_entry::SourceEntry;
use crate::util::correlation;

/// Fields written to the destination for one source entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Worklog {
    pub task_id: String,
    pub started_at: DateTime<Utc>,
    pub seconds: i64,
    pub comment: String,
}

impl Worklog {
    pub fn from_source(task_id: &str, entry: &SourceEntry, seconds: i64) -> Self {
        Self {
            task_id: task_id.to_string(),
            started_at: entry.start_utc,
            seconds,
            comment: correlation::embed(&entry.description, entry.id),
        }
    }
}
