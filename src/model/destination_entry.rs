use std::fmt;

use chrono::{DateTime, Utc};

use crate::util::correlation;

/// A worklog as stored by the issue tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationEntry {
    pub id: String,
    /// Issue key or id the worklog is attached to.
    pub issue: String,
    pub started_at: DateTime<Utc>,
    pub seconds: i64,
    pub comment: Option<String>,
    pub author: Option<String>,
    correlation_id: Option<u64>,
}

impl DestinationEntry {
    pub fn new(
        id: impl Into<String>,
        issue: impl Into<String>,
        started_at: DateTime<Utc>,
        seconds: i64,
        comment: Option<String>,
    ) -> Self {
        let correlation_id = correlation::extract(comment.as_deref());
        Self {
            id: id.into(),
            issue: issue.into(),
            started_at,
            seconds,
            comment,
            author: None,
            correlation_id,
        }
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    /// Source id embedded in the comment; `None` for hand-entered worklogs.
    pub fn correlation_id(&self) -> Option<u64> {
        self.correlation_id
    }
}

impl fmt::Display for DestinationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}), {}s, @{}, {}: {}",
            self.id,
            self.author.as_deref().unwrap_or("-"),
            self.seconds,
            self.started_at.to_rfc3339(),
            self.issue,
            self.comment.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn correlation_id_read_from_comment() {
        let started = Utc.with_ymd_and_hms(2016, 3, 1, 10, 38, 0).unwrap();
        let linked = DestinationEntry::new("1234", "PROJ-1", started, 120, Some("no comment [src#987654321]".into()));
        assert_eq!(linked.correlation_id(), Some(987654321));

        let manual = DestinationEntry::new("1235", "PROJ-1", started, 120, Some("no comment".into()));
        assert_eq!(manual.correlation_id(), None);

        let empty = DestinationEntry::new("1236", "PROJ-1", started, 120, None);
        assert_eq!(empty.correlation_id(), None);
    }
}
