pub mod jira;
pub mod redmine;
pub mod simulation;
pub mod toggl;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{AppConfig, ConfigError, EntryConfig};
use crate::credentials::Credentials;
use crate::model::destination_entry::DestinationEntry;
use crate::model::lookback::LookbackWindow;
use crate::model::source_entry::SourceEntry;
use crate::model::worklog::Worklog;

/// Resolution at which a destination stores the start of a worklog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPrecision {
    Second,
    /// Only the calendar day is kept (e.g. Redmine `spent_on`).
    Day,
}

#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch(&self, window: LookbackWindow) -> Result<Vec<SourceEntry>>;
}

#[async_trait]
pub trait DestinationClient: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, task_id: &str) -> Result<Vec<DestinationEntry>>;
    /// Returns the id of the created worklog, or None when nothing was written.
    async fn create(&self, worklog: &Worklog) -> Result<Option<String>>;
    async fn update(&self, destination_id: &str, worklog: &Worklog) -> Result<()>;
    async fn delete(&self, task_id: &str, destination_id: &str) -> Result<()>;

    /// Shortest worklog the destination accepts.
    fn min_seconds(&self) -> Option<i64> {
        None
    }
    /// Maps elapsed seconds to what the destination will actually store.
    fn normalize_seconds(&self, seconds: i64) -> i64 {
        seconds
    }
    fn start_precision(&self) -> StartPrecision {
        StartPrecision::Second
    }
}


/// Picks the destination for one config entry: Redmine when it has an API key,
/// Jira when it has a url. Returns None when neither is configured.
pub fn create_destination(
    config: &AppConfig,
    entry: &EntryConfig,
    credentials: &mut Credentials,
    simulation: bool,
) -> Result<Option<Box<dyn DestinationClient>>> {
    let client: Box<dyn DestinationClient> = if let Some(api_key) = &entry.redmine_api_key {
        let url = config
            .redmine_url()
            .ok_or_else(|| ConfigError::MissingRedmineUrl(entry.label.clone()))?;
        Box::new(redmine::RedmineClient::new(url, api_key))
    } else if let Some(url) = &entry.jira_url {
        let username = entry.jira_username.clone().unwrap_or_default();
        let password = credentials.jira_password(&username, entry.jira_password.as_deref())?;
        Box::new(jira::JiraClient::new(url, &username, &password))
    } else {
        return Ok(None);
    };

    if simulation {
        tracing::info!(destination = client.name(), "Destination is in simulation mode");
        return Ok(Some(Box::new(simulation::SimulatedDestination::new(client))));
    }
    Ok(Some(client))
}
