use anyhow::Result;
use async_trait::async_trait;

use super::{DestinationClient, StartPrecision};
use crate::model::destination_entry::DestinationEntry;
use crate::model::worklog::Worklog;

/// Reads from the wrapped destination but only reports what it would write.
pub struct SimulatedDestination {
    inner: Box<dyn DestinationClient>,
}

impl SimulatedDestination {
    pub fn new(inner: Box<dyn DestinationClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DestinationClient for SimulatedDestination {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, task_id: &str) -> Result<Vec<DestinationEntry>> {
        self.inner.fetch(task_id).await
    }

    async fn create(&self, worklog: &Worklog) -> Result<Option<String>> {
        tracing::info!(
            task_id = %worklog.task_id,
            started = %worklog.started_at,
            seconds = worklog.seconds,
            comment = %worklog.comment,
            "Simulate create"
        );
        Ok(None)
    }

    async fn update(&self, destination_id: &str, worklog: &Worklog) -> Result<()> {
        tracing::info!(
            destination_id,
            task_id = %worklog.task_id,
            started = %worklog.started_at,
            seconds = worklog.seconds,
            comment = %worklog.comment,
            "Simulate update"
        );
        Ok(())
    }

    async fn delete(&self, task_id: &str, destination_id: &str) -> Result<()> {
        tracing::info!(task_id, destination_id, "Simulate delete");
        Ok(())
    }

    fn min_seconds(&self) -> Option<i64> {
        self.inner.min_seconds()
    }

    fn normalize_seconds(&self, seconds: i64) -> i64 {
        self.inner.normalize_seconds(seconds)
    }

    fn start_precision(&self) -> StartPrecision {
        self.inner.start_precision()
    }
}
