use anyhow::{Context, Result};
use chrono::Local;

use super::reconciler::{Reconciler, RunSummary};
use crate::model::grouping::filter_valid;
use crate::model::lookback::LookbackWindow;
use crate::notify::{summary, Notifier};
use crate::providers::{DestinationClient, SourceClient};

/// One config entry's run: read the source, reconcile, report.
pub struct SyncJob<'a> {
    pub label: &'a str,
    pub source: &'a dyn SourceClient,
    pub destination: &'a dyn DestinationClient,
    pub strict: bool,
}

impl SyncJob<'_> {
    /// A source failure aborts the job: reconciling against partial data could delete
    /// or rewrite worklogs that are still valid.
    pub async fn run(
        &self,
        window: LookbackWindow,
        mut notifier: Option<&mut Notifier>,
    ) -> Result<RunSummary> {
        tracing::info!(label = self.label, destination = self.destination.name(), "Synchronization started");

        let entries = self
            .source
            .fetch(window)
            .await
            .with_context(|| format!("Failed to fetch source entries for {}", self.label))?;
        let valid = filter_valid(&entries).len();
        tracing::info!(found = entries.len(), filtered = valid, "Found entries in source");

        if let Some(notifier) = notifier.as_deref_mut() {
            notifier.extend(summary::header(self.label));
            notifier.push(summary::lookback(window.days()));
            notifier.extend(summary::entries(&entries, Local::now().date_naive()));
        }

        if valid == 0 {
            tracing::info!("No entries with task id found. Nothing to do");
            return Ok(RunSummary::default());
        }

        let result = Reconciler::new(self.destination)
            .strict(self.strict)
            .run(&entries)
            .await?;

        tracing::info!(
            inserted = result.inserted,
            updated = result.updated,
            skipped = result.skipped,
            failed = result.failures.len(),
            "Synchronization finished"
        );
        for failure in &result.failures {
            tracing::error!(task_id = %failure.task_id, cause = %failure.cause, "Task was not synchronized");
        }
        if let Some(notifier) = notifier {
            notifier.push(summary::counters(&result));
        }

        Ok(result)
    }
}
