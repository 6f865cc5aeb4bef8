use anyhow::{Context, Result};

use super::equality::{self, Mismatch};
use crate::model::destination_entry::DestinationEntry;
use crate::model::grouping::{filter_valid, group_by_correlation_id, group_by_issue, group_by_task_id};
use crate::model::source_entry::SourceEntry;
use crate::model::worklog::Worklog;
use crate::providers::{DestinationClient, StartPrecision};

/// Counters for one run. Deletes of duplicates are not counted separately.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: Vec<GroupFailure>,
}

/// A task id whose group was abandoned; changes applied before the error stay applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub task_id: String,
    pub cause: String,
}

/// Where a source entry stands against the destination worklogs carrying its id.
#[derive(Debug, PartialEq)]
pub enum MatchState<'a> {
    Unmatched,
    MatchedEqual(&'a DestinationEntry),
    MatchedUnequal(&'a DestinationEntry, Mismatch),
    MatchedDuplicate(Vec<&'a DestinationEntry>),
}

pub fn classify<'a>(
    entry: &SourceEntry,
    matches: &[&'a DestinationEntry],
    precision: StartPrecision,
) -> MatchState<'a> {
    match matches {
        [] => MatchState::Unmatched,
        [existing] => match equality::compare(entry, existing, precision) {
            Ok(()) => MatchState::MatchedEqual(*existing),
            Err(mismatch) => MatchState::MatchedUnequal(*existing, mismatch),
        },
        duplicates => MatchState::MatchedDuplicate(duplicates.to_vec()),
    }
}

/// Brings the destination in line with the source, one task id at a time.
///
/// A failing task id is recorded in the summary while the run goes on,
/// unless the reconciler is strict, in which case the error is returned at once.
pub struct Reconciler<'a> {
    destination: &'a dyn DestinationClient,
    strict: bool,
    summary: RunSummary,
}

impl<'a> Reconciler<'a> {
    pub fn new(destination: &'a dyn DestinationClient) -> Self {
        Self {
            destination,
            strict: false,
            summary: RunSummary::default(),
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub async fn run(mut self, entries: &[SourceEntry]) -> Result<RunSummary> {
        let groups = group_by_task_id(filter_valid(entries));

        for (task_id, group) in &groups {
            let outcome = self.sync_group(task_id, group).await;
            if let Err(err) = outcome {
                if self.strict {
                    return Err(err.context(format!("Failed to synchronize {task_id}")));
                }
                self.summary.failures.push(GroupFailure {
                    task_id: task_id.clone(),
                    cause: format!("{err:#}"),
                });
            }
        }

        Ok(self.summary)
    }

    async fn sync_group(&mut self, task_id: &str, entries: &[&SourceEntry]) -> Result<()> {
        tracing::info!(task_id, "Synchronizing");

        let existing = self
            .destination
            .fetch(task_id)
            .await
            .with_context(|| format!("Error downloading time entries for {task_id}"))?;
        let by_issue = group_by_issue(&existing);
        let linked: Vec<&DestinationEntry> = by_issue
            .get(task_id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|e| e.correlation_id().is_some())
            .collect();
        tracing::info!(
            task_id,
            found = existing.len(),
            linked = linked.len(),
            "Found entries in destination"
        );

        let by_source_id = group_by_correlation_id(linked);
        let precision = self.destination.start_precision();

        for entry in entries {
            let matches = by_source_id.get(&entry.id).map(Vec::as_slice).unwrap_or(&[]);
            match classify(entry, matches, precision) {
                MatchState::Unmatched => self.insert(task_id, entry).await?,
                MatchState::MatchedEqual(existing) => {
                    tracing::info!(
                        task_id,
                        destination_id = %existing.id,
                        "Up to date: {entry}"
                    );
                    self.summary.skipped += 1;
                }
                MatchState::MatchedUnequal(existing, mismatch) => {
                    tracing::debug!(task_id, source_id = entry.id, "Entries not equal, {mismatch}");
                    self.update(task_id, entry, existing).await?;
                }
                MatchState::MatchedDuplicate(duplicates) => {
                    for duplicate in duplicates {
                        self.destination.delete(task_id, &duplicate.id).await?;
                        tracing::info!(
                            task_id,
                            destination_id = %duplicate.id,
                            "Removed duplicate in destination"
                        );
                    }
                    self.insert(task_id, entry).await?;
                }
            }
        }

        Ok(())
    }

    fn worklog(&self, task_id: &str, entry: &SourceEntry) -> Worklog {
        let seconds = self.destination.normalize_seconds(entry.duration_seconds);
        Worklog::from_source(task_id, entry, seconds)
    }

    fn below_floor(&self, seconds: i64) -> bool {
        self.destination.min_seconds().is_some_and(|min| seconds < min)
    }

    async fn insert(&mut self, task_id: &str, entry: &SourceEntry) -> Result<()> {
        let worklog = self.worklog(task_id, entry);
        if self.below_floor(worklog.seconds) {
            tracing::warn!(
                task_id,
                source_id = entry.id,
                seconds = worklog.seconds,
                "Entry is below the destination minimum, not adding"
            );
            self.summary.skipped += 1;
            return Ok(());
        }

        tracing::info!(task_id, source_id = entry.id, "Inserting into destination: {entry}");
        let created = self.destination.create(&worklog).await?;
        if let Some(destination_id) = created {
            tracing::debug!(task_id, %destination_id, "Created worklog");
        }
        self.summary.inserted += 1;
        Ok(())
    }

    async fn update(
        &mut self,
        task_id: &str,
        entry: &SourceEntry,
        existing: &DestinationEntry,
    ) -> Result<()> {
        let worklog = self.worklog(task_id, entry);
        if self.below_floor(worklog.seconds) {
            tracing::info!(
                task_id,
                destination_id = %existing.id,
                seconds = worklog.seconds,
                "Entry dropped below the destination minimum, deleting instead"
            );
            self.destination.delete(task_id, &existing.id).await?;
        } else {
            tracing::info!(
                task_id,
                destination_id = %existing.id,
                "Entry changed, updating in destination: {entry}"
            );
            self.destination.update(&existing.id, &worklog).await?;
        }
        self.summary.updated += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::task_id::TaskPatterns;
    use chrono::{TimeZone, Utc};

    fn source(duration: i64) -> SourceEntry {
        let patterns = TaskPatterns::new(&["SLUG-[0-9]+"]).unwrap();
        let start = Utc.with_ymd_and_hms(2016, 1, 1, 1, 1, 1).unwrap();
        SourceEntry::new(777, duration, start, "test SLUG-333", &patterns)
    }

    fn linked(id: &str, seconds: i64) -> DestinationEntry {
        let started = Utc.with_ymd_and_hms(2016, 1, 1, 1, 1, 1).unwrap();
        DestinationEntry::new(id, "SLUG-333", started, seconds, Some("test SLUG-333 [src#777]".into()))
    }

    #[test]
    fn classify_covers_every_state() {
        let entry = source(3600);
        let same = linked("1", 3600);
        let changed = linked("2", 60);

        assert_eq!(classify(&entry, &[], StartPrecision::Second), MatchState::Unmatched);
        assert_eq!(
            classify(&entry, &[&same], StartPrecision::Second),
            MatchState::MatchedEqual(&same)
        );
        assert!(matches!(
            classify(&entry, &[&changed], StartPrecision::Second),
            MatchState::MatchedUnequal(e, Mismatch::Seconds { .. }) if e.id == "2"
        ));
        assert_eq!(
            classify(&entry, &[&same, &changed], StartPrecision::Second),
            MatchState::MatchedDuplicate(vec![&same, &changed])
        );
    }
}
