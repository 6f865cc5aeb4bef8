use chrono::{DateTime, SubsecRound, Utc};

use crate::model::destination_entry::DestinationEntry;
use crate::model::source_entry::SourceEntry;
use crate::providers::StartPrecision;
use crate::util::correlation;

/// Destinations keep time in whole minutes, so seconds are compared within this margin.
pub const SECONDS_TOLERANCE: i64 = 60;

/// The first field that differs between a source entry and its destination worklog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Mismatch {
    #[error("issue: {expected:?} vs {found:?}")]
    Issue {
        expected: Option<String>,
        found: String,
    },
    #[error("seconds (accuracy to minutes): {expected} vs {found}")]
    Seconds { expected: i64, found: i64 },
    #[error("started: {expected} vs {found}")]
    Started {
        expected: DateTime<Utc>,
        found: DateTime<Utc>,
    },
    #[error("comment: {expected:?} vs {found:?}")]
    Comment {
        expected: String,
        found: Option<String>,
    },
}

pub fn compare(
    source: &SourceEntry,
    destination: &DestinationEntry,
    precision: StartPrecision,
) -> Result<(), Mismatch> {
    if source.task_id() != Some(destination.issue.as_str()) {
        return Err(Mismatch::Issue {
            expected: source.task_id().map(String::from),
            found: destination.issue.clone(),
        });
    }

    if (source.duration_seconds - destination.seconds).abs() >= SECONDS_TOLERANCE {
        return Err(Mismatch::Seconds {
            expected: source.duration_seconds,
            found: destination.seconds,
        });
    }

    if !same_start(source.start_utc, destination.started_at, precision) {
        return Err(Mismatch::Started {
            expected: source.start_utc,
            found: destination.started_at,
        });
    }

    let comment = correlation::embed(&source.description, source.id);
    if destination.comment.as_deref() != Some(comment.as_str()) {
        return Err(Mismatch::Comment {
            expected: comment,
            found: destination.comment.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
pub fn equal(source: &SourceEntry, destination: &DestinationEntry, precision: StartPrecision) -> bool {
    compare(source, destination, precision).is_ok()
}

fn same_start(source: DateTime<Utc>, destination: DateTime<Utc>, precision: StartPrecision) -> bool {
    match precision {
        StartPrecision::Second => source.trunc_subsecs(0) == destination.trunc_subsecs(0),
        StartPrecision::Day => source.date_naive() == destination.date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::task_id::TaskPatterns;
    use chrono::{Duration, TimeZone};

    fn pair() -> (SourceEntry, DestinationEntry) {
        let patterns = TaskPatterns::new(&["SLUG-[0-9]+"]).unwrap();
        let start = Utc.with_ymd_and_hms(2020, 1, 13, 8, 11, 4).unwrap();
        let source = SourceEntry::new(777, 3600, start, "test SLUG-333", &patterns);
        let destination = DestinationEntry::new(
            "987654321",
            "SLUG-333",
            start + Duration::microseconds(123_456),
            3600,
            Some("test SLUG-333 [src#777]".into()),
        );
        (source, destination)
    }

    #[test]
    fn exact_match_ignores_subseconds() {
        let (source, destination) = pair();
        assert_eq!(compare(&source, &destination, StartPrecision::Second), Ok(()));
    }

    #[test]
    fn seconds_within_a_minute() {
        let (mut source, destination) = pair();
        source.duration_seconds += 59;
        assert!(equal(&source, &destination, StartPrecision::Second));

        source.duration_seconds = 3600 - 59;
        assert!(equal(&source, &destination, StartPrecision::Second));

        source.duration_seconds = 3660;
        assert!(matches!(
            compare(&source, &destination, StartPrecision::Second),
            Err(Mismatch::Seconds { expected: 3660, found: 3600 })
        ));
    }

    #[test]
    fn different_start() {
        let (mut source, destination) = pair();
        source.start_utc = Utc.with_ymd_and_hms(2016, 12, 25, 1, 1, 1).unwrap();
        assert!(matches!(
            compare(&source, &destination, StartPrecision::Second),
            Err(Mismatch::Started { .. })
        ));
    }

    #[test]
    fn day_precision_compares_dates() {
        let (mut source, destination) = pair();
        source.start_utc = Utc.with_ymd_and_hms(2020, 1, 13, 23, 0, 0).unwrap();
        assert!(equal(&source, &destination, StartPrecision::Day));
        assert!(!equal(&source, &destination, StartPrecision::Second));
    }

    #[test]
    fn different_comment() {
        let (mut source, destination) = pair();
        source.description = "changed SLUG-333".into();
        let err = compare(&source, &destination, StartPrecision::Second).unwrap_err();
        assert!(matches!(err, Mismatch::Comment { .. }));
        assert!(err.to_string().contains("changed SLUG-333 [src#777]"));
    }

    #[test]
    fn different_issue() {
        let (source, mut destination) = pair();
        destination.issue = "SLUG-334".into();
        assert!(matches!(
            compare(&source, &destination, StartPrecision::Second),
            Err(Mismatch::Issue { .. })
        ));
    }
}
